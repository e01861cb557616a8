use std::fmt;

#[derive(Debug, Clone)]
pub enum AdServeError {
    Validation(String),
    InvalidState(String),
    NotFound(String),
    BudgetExceeded(String),
    AggregationConflict(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    DateParse(String),
}

impl AdServeError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AdServeError::Validation(_) => "E001",
            AdServeError::InvalidState(_) => "E002",
            AdServeError::NotFound(_) => "E003",
            AdServeError::BudgetExceeded(_) => "E004",
            AdServeError::AggregationConflict(_) => "E005",
            AdServeError::DatabaseConfig(_) => "E006",
            AdServeError::DatabaseConnection(_) => "E007",
            AdServeError::DatabaseOperation(_) => "E008",
            AdServeError::Serialization(_) => "E009",
            AdServeError::DateParse(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AdServeError::Validation(_) => "Validation Error",
            AdServeError::InvalidState(_) => "Invalid State Transition",
            AdServeError::NotFound(_) => "Resource Not Found",
            AdServeError::BudgetExceeded(_) => "Budget Exceeded",
            AdServeError::AggregationConflict(_) => "Aggregation Conflict",
            AdServeError::DatabaseConfig(_) => "Database Configuration Error",
            AdServeError::DatabaseConnection(_) => "Database Connection Error",
            AdServeError::DatabaseOperation(_) => "Database Operation Error",
            AdServeError::Serialization(_) => "Serialization Error",
            AdServeError::DateParse(_) => "Date Parse Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AdServeError::Validation(msg)
            | AdServeError::InvalidState(msg)
            | AdServeError::NotFound(msg)
            | AdServeError::BudgetExceeded(msg)
            | AdServeError::AggregationConflict(msg)
            | AdServeError::DatabaseConfig(msg)
            | AdServeError::DatabaseConnection(msg)
            | AdServeError::DatabaseOperation(msg)
            | AdServeError::Serialization(msg)
            | AdServeError::DateParse(msg) => msg,
        }
    }

    /// 瞬态错误，调用方可整窗重试（见聚合器的重试策略）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdServeError::AggregationConflict(_) | AdServeError::DatabaseConnection(_)
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AdServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AdServeError {}

// 便捷的构造函数
impl AdServeError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AdServeError::Validation(msg.into())
    }

    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        AdServeError::InvalidState(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        AdServeError::NotFound(msg.into())
    }

    pub fn budget_exceeded<T: Into<String>>(msg: T) -> Self {
        AdServeError::BudgetExceeded(msg.into())
    }

    pub fn aggregation_conflict<T: Into<String>>(msg: T) -> Self {
        AdServeError::AggregationConflict(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        AdServeError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        AdServeError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        AdServeError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AdServeError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        AdServeError::DateParse(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AdServeError {
    fn from(err: sea_orm::DbErr) -> Self {
        AdServeError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AdServeError {
    fn from(err: std::io::Error) -> Self {
        AdServeError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AdServeError {
    fn from(err: serde_json::Error) -> Self {
        AdServeError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for AdServeError {
    fn from(err: chrono::ParseError) -> Self {
        AdServeError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdServeError>;
