use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// A UNIQUE, PRIMARY KEY or CHECK constraint rejected the statement.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A FOREIGN KEY constraint found no referenced row.
    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("connection error: {0}")]
    Connection(String),
}
