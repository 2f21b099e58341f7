pub mod author;
pub mod book;
pub mod borrower;
pub mod category;
pub mod loan;
pub mod publisher;
