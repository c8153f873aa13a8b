pub mod reconciliation_result;
pub mod simulated_purchase;
pub mod token_record;
