use crate::{Error, MappingError, Value};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int,
    Long,
    Float,
    Double,
    Numeric,
    String,
    Bool,
    Date,
    Time,
    DateTime,
    Blob,
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Long => "long",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Numeric => "numeric",
            ColumnType::String => "string",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::DateTime => "datetime",
            ColumnType::Blob => "blob",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Long)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "int" => ColumnType::Int,
            "long" => ColumnType::Long,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            "numeric" => ColumnType::Numeric,
            "string" => ColumnType::String,
            "bool" => ColumnType::Bool,
            "date" => ColumnType::Date,
            "time" => ColumnType::Time,
            "datetime" => ColumnType::DateTime,
            "blob" => ColumnType::Blob,
            _ => return Err(MappingError::invalid_spec(format!("Unknown column type `{s}`"))),
        })
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum ColumnSize {
    #[default]
    Unsized,
    Length(u32),
    /// Only meaningful for numeric columns as `[precision, scale]`.
    List(Vec<u32>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Literal default, `Value::Null` renders no clause.
    Value(Value),
    /// Current timestamp of the backend.
    Now,
    /// SQL expression emitted verbatim.
    Raw(String),
}

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Cascade,
    SetNull,
}

impl Action {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Action::Cascade => "cascade",
            Action::SetNull => "set null",
        }
    }
}

impl FromStr for Action {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Action::Cascade),
            "set_null" | "set null" => Ok(Action::SetNull),
            _ => Err(MappingError::invalid_spec(format!(
                "Unknown referential action `{s}`"
            ))),
        }
    }
}

/// Metadata of one mapped field.
///
/// Built once through the chained methods and then handed to the
/// [`Registry`](crate::Registry). Structural problems (a size list on a non
/// numeric column, a literal default on a blob) are reported by the
/// [`SqlWriter`](crate::SqlWriter) when it renders the column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub column_type: ColumnType,
    pub size: ColumnSize,
    pub fixed_size: bool,
    pub not_null: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub default: Option<DefaultValue>,
    /// Target `[entity, column]`.
    pub foreign_key: Option<Vec<String>>,
    pub on_delete: Option<Action>,
    pub on_update: Option<Action>,
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            size: ColumnSize::Unsized,
            fixed_size: false,
            not_null: false,
            auto_increment: false,
            primary_key: false,
            default: None,
            foreign_key: None,
            on_delete: None,
            on_update: None,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = ColumnSize::Length(size);
        self
    }

    pub fn size_list(mut self, size: impl IntoIterator<Item = u32>) -> Self {
        self.size = ColumnSize::List(size.into_iter().collect());
        self
    }

    /// Shorthand for a `[precision, scale]` size.
    pub fn precision(self, precision: u32, scale: u32) -> Self {
        self.size_list([precision, scale])
    }

    pub fn fixed_size(mut self) -> Self {
        self.fixed_size = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Literal default value.
    pub fn default(self, value: impl Into<Value>) -> Self {
        self.default_value(DefaultValue::Value(value.into()))
    }

    pub fn default_now(self) -> Self {
        self.default_value(DefaultValue::Now)
    }

    pub fn default_raw(self, expression: impl Into<String>) -> Self {
        self.default_value(DefaultValue::Raw(expression.into()))
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn foreign_key(mut self, target: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.foreign_key = Some(target.into_iter().map(Into::into).collect());
        self
    }

    pub fn on_delete(mut self, action: Action) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: Action) -> Self {
        self.on_update = Some(action);
        self
    }
}
