pub mod loan_draft;
