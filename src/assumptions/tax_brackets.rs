//! Progressive income-tax brackets and the quotient familial

/// One bracket of the progressive scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBracket {
    /// Lower bound of taxable income per part
    pub lower: f64,
    /// Upper bound (infinite for the top bracket)
    pub upper: f64,
    /// Marginal rate as a decimal
    pub rate: f64,
}

/// Progressive scale applied per fiscal part
#[derive(Debug, Clone, PartialEq)]
pub struct TaxBrackets {
    brackets: Vec<TaxBracket>,
}

impl TaxBrackets {
    /// Create from loaded CSV rows (lower, upper, rate)
    pub fn from_loaded(rows: &[(f64, f64, f64)]) -> Self {
        let mut brackets: Vec<TaxBracket> = rows
            .iter()
            .map(|&(lower, upper, rate)| TaxBracket { lower, upper, rate })
            .collect();
        brackets.sort_by(|a, b| a.lower.total_cmp(&b.lower));
        Self { brackets }
    }

    /// French scale applied to 2024 income
    pub fn france_2024() -> Self {
        Self::from_loaded(&[
            (0.0, 11_294.0, 0.0),
            (11_294.0, 28_797.0, 0.11),
            (28_797.0, 82_341.0, 0.30),
            (82_341.0, 177_106.0, 0.41),
            (177_106.0, f64::INFINITY, 0.45),
        ])
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Tax due on the income of a single part
    pub fn tax_per_part(&self, income_per_part: f64) -> f64 {
        self.brackets
            .iter()
            .filter(|b| income_per_part > b.lower)
            .map(|b| (income_per_part.min(b.upper) - b.lower) * b.rate)
            .sum()
    }

    /// Household tax: scale applied to income / parts, multiplied back by parts
    pub fn household_tax(&self, taxable_income: f64, parts: f64) -> f64 {
        if !(taxable_income > 0.0) || !(parts > 0.0) {
            return 0.0;
        }
        self.tax_per_part(taxable_income / parts) * parts
    }

    /// Marginal rate reached by a household
    pub fn marginal_rate(&self, taxable_income: f64, parts: f64) -> f64 {
        if !(parts > 0.0) {
            return 0.0;
        }
        let per_part = taxable_income / parts;
        self.brackets
            .iter()
            .filter(|b| per_part > b.lower)
            .map(|b| b.rate)
            .last()
            .unwrap_or(0.0)
    }
}

impl Default for TaxBrackets {
    fn default() -> Self {
        Self::france_2024()
    }
}

/// Number of fiscal parts of a household
///
/// One part per adult, half a part per dependent child, plus half a part for a
/// single parent still supporting a child (case T). Never below one part.
pub fn household_parts(adults: usize, dependents: usize, single_parent: bool) -> f64 {
    let mut parts = adults as f64 + 0.5 * dependents as f64;
    if single_parent && dependents > 0 {
        parts += 0.5;
    }
    parts.max(1.0)
}
