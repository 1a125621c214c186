pub mod check;
pub mod cu_compare;
