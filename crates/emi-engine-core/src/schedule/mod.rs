pub mod installment;
pub mod repayment;
