use crate::{DataMap, Params, Value};

/// One entry of the selected field list.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Column selected as is.
    Named(String),
    /// Column selected under a different name.
    Aliased { alias: String, field: String },
    /// SQL expression emitted verbatim under an alias.
    Raw { alias: String, expression: String },
}

impl Field {
    pub fn named(field: impl Into<String>) -> Self {
        Field::Named(field.into())
    }

    pub fn aliased(alias: impl Into<String>, field: impl Into<String>) -> Self {
        Field::Aliased {
            alias: alias.into(),
            field: field.into(),
        }
    }

    pub fn raw(alias: impl Into<String>, expression: impl Into<String>) -> Self {
        Field::Raw {
            alias: alias.into(),
            expression: expression.into(),
        }
    }

    /// Name the field is exposed as in the result set.
    pub fn selected_name(&self) -> &str {
        match self {
            Field::Named(field) => field,
            Field::Aliased { alias, .. } | Field::Raw { alias, .. } => alias,
        }
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::Named(value.into())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::Named(value)
    }
}

/// What a query reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Registered entity, by type identity or simple name.
    Entity(String),
    /// Nested query rendered as a derived table.
    Query(Box<Query>),
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Entity(value.into())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Entity(value)
    }
}

impl From<Query> for Source {
    fn from(value: Query) -> Self {
        Source::Query(value.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    FullOuter,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::FullOuter => "full outer",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub source: Source,
    pub on: String,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Dialect agnostic description of a select.
///
/// `add_*` methods append, `set_*` methods replace. Nothing is validated here,
/// the [`SqlWriter`](crate::SqlWriter) resolves names against the registry when
/// rendering. Conditions are raw SQL, untrusted input must go through the named
/// parameters.
///
/// ```rust
/// use rowmap_core::{Order, Query, data_map};
/// let mut query = Query::new("TestUser");
/// query
///     .add_fields(["id", "name"])
///     .add_condition("active = :active", data_map! { ":active" => true })
///     .add_order_by("name", Order::Asc)
///     .set_limit(0, 10);
/// assert_eq!(query.params().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub source: Source,
    pub fields: Vec<Field>,
    pub conditions: Vec<String>,
    pub joins: Vec<Join>,
    pub group_by: Vec<String>,
    pub order_by: Vec<(String, Order)>,
    pub offset: Option<i64>,
    pub max: Option<i64>,
    pub variables: Params,
}

impl Query {
    pub fn new(source: impl Into<Source>) -> Self {
        Self {
            source: source.into(),
            fields: Vec::new(),
            conditions: Vec::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            max: None,
            variables: Params::new(),
        }
    }

    pub fn set_source(&mut self, source: impl Into<Source>) -> &mut Self {
        self.source = source.into();
        self
    }

    pub fn add_fields<F: Into<Field>>(&mut self, fields: impl IntoIterator<Item = F>) -> &mut Self {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn add_field(&mut self, field: impl Into<Field>) -> &mut Self {
        self.fields.push(field.into());
        self
    }

    pub fn set_fields<F: Into<Field>>(&mut self, fields: impl IntoIterator<Item = F>) -> &mut Self {
        self.fields.clear();
        self.add_fields(fields)
    }

    /// Appends a condition, it is ANDed with the others. Its parameters are merged.
    pub fn add_condition(&mut self, condition: impl Into<String>, params: DataMap) -> &mut Self {
        self.conditions.push(condition.into());
        self.variables.extend(params);
        self
    }

    pub fn add_variables(&mut self, variables: DataMap) -> &mut Self {
        self.variables.extend(variables);
        self
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.variables.insert(name, value);
        self
    }

    pub fn set_variables(&mut self, variables: DataMap) -> &mut Self {
        self.variables = variables;
        self
    }

    pub fn add_join(
        &mut self,
        join_type: JoinType,
        source: impl Into<Source>,
        on: impl Into<String>,
    ) -> &mut Self {
        self.joins.push(Join {
            join_type,
            source: source.into(),
            on: on.into(),
        });
        self
    }

    pub fn add_inner_join(&mut self, source: impl Into<Source>, on: impl Into<String>) -> &mut Self {
        self.add_join(JoinType::Inner, source, on)
    }

    pub fn add_left_join(&mut self, source: impl Into<Source>, on: impl Into<String>) -> &mut Self {
        self.add_join(JoinType::Left, source, on)
    }

    pub fn add_group_by(&mut self, field: impl Into<String>) -> &mut Self {
        self.group_by.push(field.into());
        self
    }

    pub fn set_group_by<S: Into<String>>(&mut self, fields: impl IntoIterator<Item = S>) -> &mut Self {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_order_by(&mut self, field: impl Into<String>, order: Order) -> &mut Self {
        self.order_by.push((field.into(), order));
        self
    }

    pub fn set_order_by<S: Into<String>>(
        &mut self,
        entries: impl IntoIterator<Item = (S, Order)>,
    ) -> &mut Self {
        self.order_by = entries.into_iter().map(|(f, o)| (f.into(), o)).collect();
        self
    }

    pub fn set_limit(&mut self, offset: i64, max: i64) -> &mut Self {
        self.offset = Some(offset);
        self.max = Some(max);
        self
    }

    pub fn clear_limit(&mut self) -> &mut Self {
        self.offset = None;
        self.max = None;
        self
    }

    pub fn has_limit(&self) -> bool {
        self.max.is_some()
    }

    /// Parameters of every condition plus the explicitly added ones.
    pub fn params(&self) -> &Params {
        &self.variables
    }

    /// [`Query::params`] merged with the parameters of the nested queries.
    pub fn all_params(&self) -> Params {
        let mut result = Params::new();
        let nested = std::iter::once(&self.source).chain(self.joins.iter().map(|j| &j.source));
        for source in nested {
            if let Source::Query(query) = source {
                result.extend(query.all_params());
            }
        }
        result.extend(self.variables.clone());
        result
    }
}
