use serde::{Deserialize, Serialize};

use crate::domain::MunicipalityId;

/// Body of `POST <base>/tax/calculate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRequest {
    pub municipality_id: MunicipalityId,
    pub gross_monthly_salary: f64,
    #[serde(default)]
    pub church_member: bool,
    #[serde(default)]
    pub is_pensioner: bool,
}

impl TaxRequest {
    pub fn new(municipality_id: impl Into<MunicipalityId>, gross_monthly_salary: f64) -> Self {
        Self {
            municipality_id: municipality_id.into(),
            gross_monthly_salary,
            church_member: false,
            is_pensioner: false,
        }
    }

    pub fn with_church_member(mut self, church_member: bool) -> Self {
        self.church_member = church_member;
        self
    }

    pub fn with_pensioner(mut self, is_pensioner: bool) -> Self {
        self.is_pensioner = is_pensioner;
        self
    }
}

/// Calculation returned by the tax service. Rates are decimals (0.228 = 22.8%),
/// `yearly_*` amounts are per year and `monthly_*` amounts per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub municipality_id: MunicipalityId,
    pub municipality_name: String,
    pub region_name: String,

    pub gross_monthly_salary: f64,
    pub gross_yearly_salary: f64,

    pub municipal_tax_rate: f64,
    pub regional_tax_rate: f64,
    pub state_tax_rate: f64,
    pub burial_fee_rate: f64,
    pub church_fee_rate: f64,

    pub yearly_basic_deduction: f64,
    pub yearly_job_tax_credit: f64,

    pub yearly_taxable_income: f64,
    pub yearly_municipal_tax: f64,
    pub yearly_regional_tax: f64,
    pub yearly_state_tax: f64,
    pub yearly_burial_fee: f64,
    pub yearly_church_fee: f64,
    pub yearly_total_tax: f64,

    pub monthly_total_tax: f64,
    pub net_monthly_salary: f64,

    pub effective_tax_rate: f64,
}
