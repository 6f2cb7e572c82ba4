use crate::db_types::Order;

/// The outcome of a conditional order insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    /// The order was new and has been stored.
    Inserted(Order),
    /// An order for the same payment intent already existed. Carries the internal id of the existing row.
    AlreadyExists(i64),
}
