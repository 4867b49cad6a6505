pub mod emi;
pub mod terms;
