pub mod nvt;
