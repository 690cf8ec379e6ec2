pub mod audit;
pub mod auth;
pub mod catalog;
pub mod crm;
pub mod purchasing;
pub mod quotes;
pub mod sales;

use rust_decimal::Decimal;
use validator::ValidationError;

// Validação customizada compartilhada pelos payloads com campos `Decimal`
// (o `range` do validator não cobre Decimal).
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}
