use bon::Builder;
use garde::Validate;

// =======================================
// QUERY PARAMETER STRUCT
// =======================================
#[derive(Debug, Clone, Validate, Builder)]
#[garde(allow_unvalidated)]
pub struct QueryParams {
    // Measured value (cm, kg, kg/m², ... depending on the measurement)
    #[garde(custom(validate_measurement_value))]
    pub value: f64,

    // Chronological age in days since birth
    #[garde(range(min = 0))]
    pub age_days: Option<i64>,

    // Gestational age in days since the last menstrual period
    #[garde(range(min = 0))]
    pub gestational_age: Option<i64>,
}

impl QueryParams {
    /// Validate with Result<(), garde::Report>
    pub fn validate_all(&self) -> Result<(), garde::Report> {
        self.validate()
    }
}

/// Custom validation function for the measured value
fn validate_measurement_value(value: &f64, _context: &()) -> garde::Result {
    if !value.is_finite() {
        return Err(garde::Error::new(
            "measurement value must be a finite number",
        ));
    }
    if *value <= 0.0 {
        return Err(garde::Error::new(
            "measurement value must be positive as the LMS transform is defined for positive measurements only",
        ));
    }
    Ok(())
}
