//! Clause components and the bag that holds them
//!
//! Every builder call that shapes a statement appends one [`Component`]. The
//! grammar reads them back through the typed extractors on [`ComponentBag`].

use crate::core::value::DatabaseValue;

/// Kind selector used to query a [`ComponentBag`]
///
/// Some kinds are families: asking for [`ComponentKind::CreateColumn`] yields
/// both added and altered columns, [`ComponentKind::CreateConstraint`] yields
/// every constraint type and [`ComponentKind::Condition`] yields where and
/// having conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Table,
    Distinct,
    Column,
    Join,
    Condition,
    Where,
    Having,
    Group,
    Order,
    Limit,
    Offset,
    CreateColumn,
    AddColumn,
    AlterColumn,
    DropColumn,
    CreateConstraint,
    PrimaryKey,
    Unique,
    Index,
    ForeignKey,
    DropConstraint,
}

impl ComponentKind {
    /// Whether a component of kind `actual` answers a request for `self`
    pub fn matches(self, actual: ComponentKind) -> bool {
        if self == actual {
            return true;
        }

        match self {
            ComponentKind::Condition => {
                matches!(actual, ComponentKind::Where | ComponentKind::Having)
            }
            ComponentKind::CreateColumn => {
                matches!(actual, ComponentKind::AddColumn | ComponentKind::AlterColumn)
            }
            ComponentKind::CreateConstraint => matches!(
                actual,
                ComponentKind::PrimaryKey
                    | ComponentKind::Unique
                    | ComponentKind::Index
                    | ComponentKind::ForeignKey
            ),
            _ => false,
        }
    }
}

/// Join flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Natural,
}

impl JoinType {
    /// SQL keyword preceding `JOIN`
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
            JoinType::Natural => "NATURAL",
        }
    }
}

/// One `first op second` comparison inside a join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub first: String,
    pub operator: String,
    pub second: String,
    /// Chained with OR instead of AND
    pub or: bool,
}

/// A joined table with its comparison chain
#[derive(Debug, Clone, PartialEq)]
pub struct JoinComponent {
    pub join_type: JoinType,
    pub table: String,
    pub clauses: Vec<JoinClause>,
}

impl JoinComponent {
    /// Join `table` with no clauses yet
    pub fn new(join_type: JoinType, table: impl Into<String>) -> Self {
        Self {
            join_type,
            table: table.into(),
            clauses: Vec::new(),
        }
    }

    /// Add a comparison chained with AND
    #[must_use]
    pub fn on(mut self, first: &str, operator: &str, second: &str) -> Self {
        self.clauses.push(JoinClause {
            first: first.to_string(),
            operator: operator.to_string(),
            second: second.to_string(),
            or: false,
        });
        self
    }

    /// Add a comparison chained with OR
    #[must_use]
    pub fn or_on(mut self, first: &str, operator: &str, second: &str) -> Self {
        self.clauses.push(JoinClause {
            first: first.to_string(),
            operator: operator.to_string(),
            second: second.to_string(),
            or: true,
        });
        self
    }
}

/// A `column op value` predicate of a WHERE or HAVING clause
///
/// The value is kept alongside the binding so the grammar can size the
/// placeholder. `None` means the operator takes no operand (`IS NULL`).
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: String,
    pub value: Option<DatabaseValue>,
    /// Chained with OR instead of AND
    pub or: bool,
}

impl Condition {
    /// Build a condition
    pub fn new(column: &str, operator: &str, value: Option<DatabaseValue>, or: bool) -> Self {
        Self {
            column: column.to_string(),
            operator: operator.to_string(),
            value,
            or,
        }
    }
}

/// Portable column types understood by every schema grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    BigInteger,
    Decimal,
    String,
    Text,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    Boolean,
}

impl ColumnType {
    /// Generic SQL spelling
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInteger => "BIGINT",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::String => "VARCHAR",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Binary => "BLOB",
            ColumnType::Boolean => "BOOLEAN",
        }
    }
}

/// Everything needed to render one column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    /// Display length, 0 when unset
    pub length: u32,
    /// Digits after the decimal point, 0 when unset
    pub scale: u32,
    pub nullable: bool,
    pub unsigned: bool,
    pub incremented: bool,
    pub default: Option<DatabaseValue>,
}

impl ColumnDefinition {
    /// A NOT NULL column with no length, modifiers or default
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            length: 0,
            scale: 0,
            nullable: false,
            unsigned: false,
            incremented: false,
            default: None,
        }
    }
}

/// A column being added, or redefined by an ALTER
#[derive(Debug, Clone, PartialEq)]
pub enum CreateColumn {
    Add(ColumnDefinition),
    Alter(ColumnDefinition),
}

impl CreateColumn {
    /// The column definition regardless of mode
    pub fn definition(&self) -> &ColumnDefinition {
        match self {
            CreateColumn::Add(definition) | CreateColumn::Alter(definition) => definition,
        }
    }

    pub(crate) fn definition_mut(&mut self) -> &mut ColumnDefinition {
        match self {
            CreateColumn::Add(definition) | CreateColumn::Alter(definition) => definition,
        }
    }

    /// Whether this redefines an existing column
    pub fn is_alter(&self) -> bool {
        matches!(self, CreateColumn::Alter(_))
    }

    /// Convert to the alter form
    pub fn into_alter(self) -> Self {
        match self {
            CreateColumn::Add(definition) | CreateColumn::Alter(definition) => {
                CreateColumn::Alter(definition)
            }
        }
    }
}

/// Table constraint types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    Index,
    ForeignKey,
}

impl ConstraintType {
    /// Generic SQL spelling
    pub fn sql_name(&self) -> &'static str {
        match self {
            ConstraintType::PrimaryKey => "PRIMARY KEY",
            ConstraintType::Unique => "UNIQUE",
            ConstraintType::Index => "INDEX",
            ConstraintType::ForeignKey => "FOREIGN KEY",
        }
    }

    fn kind(&self) -> ComponentKind {
        match self {
            ConstraintType::PrimaryKey => ComponentKind::PrimaryKey,
            ConstraintType::Unique => ComponentKind::Unique,
            ConstraintType::Index => ComponentKind::Index,
            ConstraintType::ForeignKey => ComponentKind::ForeignKey,
        }
    }
}

/// Target of a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignReference {
    pub table: String,
    pub column: String,
    pub on_delete: String,
    pub on_update: String,
}

/// A named constraint over one column (or a comma separated column list)
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDefinition {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub column: String,
    /// Set for foreign keys only
    pub reference: Option<ForeignReference>,
}

/// One clause of a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Table(String),
    Distinct(bool),
    /// Comma separated column list from one `column`/`select` call
    Column(String),
    Join(JoinComponent),
    Where(Condition),
    Having(Condition),
    /// Comma separated column list from one `group` call
    Group(String),
    Order {
        column: String,
        ascending: bool,
    },
    Limit(u64),
    Offset(u64),
    CreateColumn(CreateColumn),
    DropColumn(String),
    CreateConstraint(ConstraintDefinition),
    DropConstraint {
        constraint_type: ConstraintType,
        name: String,
    },
}

impl Component {
    /// Most specific kind of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Table(_) => ComponentKind::Table,
            Component::Distinct(_) => ComponentKind::Distinct,
            Component::Column(_) => ComponentKind::Column,
            Component::Join(_) => ComponentKind::Join,
            Component::Where(_) => ComponentKind::Where,
            Component::Having(_) => ComponentKind::Having,
            Component::Group(_) => ComponentKind::Group,
            Component::Order { .. } => ComponentKind::Order,
            Component::Limit(_) => ComponentKind::Limit,
            Component::Offset(_) => ComponentKind::Offset,
            Component::CreateColumn(CreateColumn::Add(_)) => ComponentKind::AddColumn,
            Component::CreateColumn(CreateColumn::Alter(_)) => ComponentKind::AlterColumn,
            Component::DropColumn(_) => ComponentKind::DropColumn,
            Component::CreateConstraint(definition) => definition.constraint_type.kind(),
            Component::DropConstraint { .. } => ComponentKind::DropConstraint,
        }
    }
}

/// Ordered collection of the components of one statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentBag {
    components: Vec<Component>,
}

impl ComponentBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component
    pub fn add(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Earliest component answering `kind`
    pub fn first(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|c| kind.matches(c.kind()))
    }

    /// Every component answering `kind`, in insertion order
    pub fn all(&self, kind: ComponentKind) -> Vec<&Component> {
        self.components
            .iter()
            .filter(|c| kind.matches(c.kind()))
            .collect()
    }

    /// Whether any component answers `kind`
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|c| kind.matches(c.kind()))
    }

    /// Remove the earliest component answering `kind`
    pub fn remove_first(&mut self, kind: ComponentKind) -> bool {
        match self.components.iter().position(|c| kind.matches(c.kind())) {
            Some(index) => {
                self.components.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every component answering `kind`
    pub fn remove_all(&mut self, kind: ComponentKind) -> bool {
        let before = self.components.len();
        self.components.retain(|c| !kind.matches(c.kind()));
        self.components.len() != before
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the bag is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate over all components in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Component> {
        self.components.get_mut(index)
    }

    pub fn table(&self) -> Option<&str> {
        self.components.iter().find_map(|c| match c {
            Component::Table(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn distinct(&self) -> bool {
        self.components
            .iter()
            .find_map(|c| match c {
                Component::Distinct(flag) => Some(*flag),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn columns(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::Column(list) => Some(list.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn joins(&self) -> Vec<&JoinComponent> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::Join(join) => Some(join),
                _ => None,
            })
            .collect()
    }

    pub fn wheres(&self) -> Vec<&Condition> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::Where(condition) => Some(condition),
                _ => None,
            })
            .collect()
    }

    pub fn havings(&self) -> Vec<&Condition> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::Having(condition) => Some(condition),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::Group(list) => Some(list.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `(column, ascending)` pairs
    pub fn orders(&self) -> Vec<(&str, bool)> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::Order { column, ascending } => Some((column.as_str(), *ascending)),
                _ => None,
            })
            .collect()
    }

    pub fn limit(&self) -> Option<u64> {
        self.components.iter().find_map(|c| match c {
            Component::Limit(n) => Some(*n),
            _ => None,
        })
    }

    pub fn offset(&self) -> Option<u64> {
        self.components.iter().find_map(|c| match c {
            Component::Offset(n) => Some(*n),
            _ => None,
        })
    }

    pub fn create_columns(&self) -> Vec<&CreateColumn> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::CreateColumn(column) => Some(column),
                _ => None,
            })
            .collect()
    }

    pub fn drop_columns(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::DropColumn(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn create_constraints(&self) -> Vec<&ConstraintDefinition> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::CreateConstraint(definition) => Some(definition),
                _ => None,
            })
            .collect()
    }

    /// `(type, name)` pairs
    pub fn drop_constraints(&self) -> Vec<(ConstraintType, &str)> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::DropConstraint {
                    constraint_type,
                    name,
                } => Some((*constraint_type, name.as_str())),
                _ => None,
            })
            .collect()
    }
}

impl IntoIterator for ComponentBag {
    type Item = Component;
    type IntoIter = std::vec::IntoIter<Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.into_iter()
    }
}

impl<'a> IntoIterator for &'a ComponentBag {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
