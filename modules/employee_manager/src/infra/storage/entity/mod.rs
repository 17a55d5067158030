//! SeaORM entities. Salaries are stored as REAL and converted to
//! two-decimal `Decimal` values in `mapper`. Name columns carry a
//! lowercased `*_folded` twin used for searching and sorting.

pub mod company;
pub mod department;
pub mod employee;
