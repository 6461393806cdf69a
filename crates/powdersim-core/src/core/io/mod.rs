//! Reading and writing of the file formats powdersim exchanges with the outside world.
//!
//! Structures and instrument descriptions are read from CIF documents (both the DDL1
//! underscore spellings and the DDLm dotted spellings are accepted). Phases can be
//! written back to CIF, which is how the file-driven simulator engine receives them.
//! Calculated profiles and reflection lists are written as CSV tables.

pub mod cif;
pub mod table;
