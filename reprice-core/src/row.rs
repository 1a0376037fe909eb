//! Typed view of catalog rows.
//!
//! The store hands out rows as cells keyed by header label. Known pricing
//! columns are parsed into [`ProductCostInputs`]; everything else is kept
//! aside so a write-back never loses user-added columns.

use std::collections::{BTreeMap, HashMap};

use reprice_catalog::money::format_amount;
use reprice_catalog::{
    ChannelKind, GiftAttach, PartnerTier, PricingBreakdown, PricingError, ProductCostInputs,
    ProductLine,
};

/// Header labels the engine reads
pub mod columns {
    pub const SKU: &str = "SKU";
    pub const LINE: &str = "Product Line";
    pub const MANUAL_UNIT_PRICE: &str = "Factory Price Manual";
    pub const CARTON_TOTAL: &str = "Carton Total";
    pub const UNITS_PER_CARTON: &str = "Units Per Carton";
    pub const LEGACY_UNIT_COST: &str = "Unit Cost";
    pub const INBOUND_FREIGHT: &str = "Inbound Freight";
    pub const CUSTOMS_DUTY: &str = "Customs Duty";
    pub const PACKAGING: &str = "Packaging";
    pub const LABELING: &str = "Labeling";
    pub const WAREHOUSING: &str = "Warehousing";
    pub const PICK_PACK: &str = "Pick Pack";
    pub const INSURANCE: &str = "Insurance";
    pub const QUALITY_CONTROL: &str = "Quality Control";
    pub const GIFT_SKU: &str = "Gift SKU";
    pub const GIFT_COST: &str = "Gift Cost";
    pub const GIFT_FUNDING_SHARE: &str = "Gift Funding Share";
    pub const GIFT_SHIPPING_INCREMENT: &str = "Gift Shipping Increment";
    pub const GIFT_ATTACH_RATE: &str = "Gift Attach Rate";
    pub const NET_CONTENT_ML: &str = "Net Content ml";
    pub const WEIGHT_G: &str = "Weight g";
    pub const SIZE_TIER: &str = "Size Tier";
    pub const REFERRAL_PCT_OVERRIDE: &str = "Referral Pct Override";
    pub const UVP_OVERRIDE_GROSS: &str = "UVP Override Gross";

    pub const INPUT: [&str; 24] = [
        SKU,
        LINE,
        MANUAL_UNIT_PRICE,
        CARTON_TOTAL,
        UNITS_PER_CARTON,
        LEGACY_UNIT_COST,
        INBOUND_FREIGHT,
        CUSTOMS_DUTY,
        PACKAGING,
        LABELING,
        WAREHOUSING,
        PICK_PACK,
        INSURANCE,
        QUALITY_CONTROL,
        GIFT_SKU,
        GIFT_COST,
        GIFT_FUNDING_SHARE,
        GIFT_SHIPPING_INCREMENT,
        GIFT_ATTACH_RATE,
        NET_CONTENT_ML,
        WEIGHT_G,
        SIZE_TIER,
        REFERRAL_PCT_OVERRIDE,
        UVP_OVERRIDE_GROSS,
    ];

    pub const FULL_COST: &str = "Full Cost";
    pub const UVP_NET: &str = "UVP Net";
    pub const UVP_GROSS: &str = "UVP Gross";
    pub const GRUNDPREIS: &str = "Grundpreis";
    pub const FLOOR_NET: &str = "Floor Net";
    pub const DIRECT_MARGIN: &str = "Direct Margin %";
    pub const DIRECT_GUARDRAIL: &str = "Direct Guardrail";
    pub const MARKETPLACE_MARGIN: &str = "Marketplace Margin %";
    pub const MARKETPLACE_GUARDRAIL: &str = "Marketplace Guardrail";
    pub const DEALER_BASIC: &str = "Dealer Basic";
    pub const DEALER_PLUS: &str = "Dealer Plus";
    pub const STAND_PARTNER: &str = "Stand Partner";
    pub const STAND_PARTNER_BONUS: &str = "Stand Partner Bonus";
    pub const DISTRIBUTOR: &str = "Distributor";
    pub const PRICING_WARNINGS: &str = "Pricing Warnings";
}

/// Columns the engine owns and overwrites on every run
pub const OUTPUT_COLUMNS: [&str; 15] = [
    columns::FULL_COST,
    columns::UVP_NET,
    columns::UVP_GROSS,
    columns::GRUNDPREIS,
    columns::FLOOR_NET,
    columns::DIRECT_MARGIN,
    columns::DIRECT_GUARDRAIL,
    columns::MARKETPLACE_MARGIN,
    columns::MARKETPLACE_GUARDRAIL,
    columns::DEALER_BASIC,
    columns::DEALER_PLUS,
    columns::STAND_PARTNER,
    columns::STAND_PARTNER_BONUS,
    columns::DISTRIBUTOR,
    columns::PRICING_WARNINGS,
];

#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("Row {0} has no SKU")]
    MissingSku(usize),

    #[error("Malformed number in column '{column}': '{value}'")]
    MalformedNumber { column: String, value: String },

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A parsed catalog row
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    /// Sheet row number, the header being row 1
    pub sheet_row: usize,
    pub inputs: ProductCostInputs,
    /// Cells of columns the engine neither reads nor writes, by header.
    /// On duplicate headers only the first column is kept.
    pub extra: BTreeMap<String, String>,
}

/// Sheet row number of the data row at `index`; the header is row 1
pub fn sheet_row(index: usize) -> usize {
    index + 2
}

fn key(header: &str) -> String {
    header.trim().to_ascii_lowercase()
}

fn is_known(header: &str) -> bool {
    let k = key(header);
    columns::INPUT
        .iter()
        .chain(OUTPUT_COLUMNS.iter())
        .any(|c| key(c) == k)
}

/// Header positions of one table
#[derive(Debug, Clone)]
pub struct SheetLayout {
    headers: Vec<String>,
    positions: HashMap<String, usize>,
}

impl SheetLayout {
    pub fn new(headers: Vec<String>) -> Self {
        let mut positions = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            // First occurrence wins on duplicate headers
            positions.entry(key(header)).or_insert(index);
        }
        Self { headers, positions }
    }

    /// Append any output column the table does not have yet.
    pub fn with_output_columns(mut self) -> Self {
        for column in OUTPUT_COLUMNS {
            if !self.positions.contains_key(&key(column)) {
                self.positions.insert(key(column), self.headers.len());
                self.headers.push(column.to_string());
            }
        }
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn is_blank(cells: &[String]) -> bool {
        cells.iter().all(|c| c.trim().is_empty())
    }

    fn cell<'a>(&self, cells: &'a [String], column: &str) -> Option<&'a str> {
        let position = *self.positions.get(&key(column))?;
        cells.get(position).map(|c| c.trim()).filter(|c| !c.is_empty())
    }

    fn number(&self, cells: &[String], column: &str) -> Result<Option<f64>, RowError> {
        match self.cell(cells, column) {
            None => Ok(None),
            Some(raw) => parse_number(raw).map(Some).ok_or_else(|| RowError::MalformedNumber {
                column: column.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// SKU of a row, if present, for error reporting
    pub fn sku(&self, cells: &[String]) -> Option<String> {
        self.cell(cells, columns::SKU).map(str::to_string)
    }

    /// Parse the data row at `index` (0 is the first row under the header)
    pub fn parse(&self, index: usize, cells: &[String]) -> Result<ProductRow, RowError> {
        let sheet_row = sheet_row(index);
        let sku = self.sku(cells).ok_or(RowError::MissingSku(sheet_row))?;
        let line = self
            .cell(cells, columns::LINE)
            .map(ProductLine::from_label)
            .unwrap_or(ProductLine::Other);

        let mut inputs = ProductCostInputs::new(sku, line);
        inputs.manual_unit_price = self.number(cells, columns::MANUAL_UNIT_PRICE)?;
        inputs.carton_total = self.number(cells, columns::CARTON_TOTAL)?;
        inputs.units_per_carton = self.number(cells, columns::UNITS_PER_CARTON)?;
        inputs.legacy_unit_cost = self.number(cells, columns::LEGACY_UNIT_COST)?;

        let components = &mut inputs.components;
        components.inbound_freight = self.number(cells, columns::INBOUND_FREIGHT)?.unwrap_or(0.0);
        components.customs_duty = self.number(cells, columns::CUSTOMS_DUTY)?.unwrap_or(0.0);
        components.packaging = self.number(cells, columns::PACKAGING)?.unwrap_or(0.0);
        components.labeling = self.number(cells, columns::LABELING)?.unwrap_or(0.0);
        components.warehousing = self.number(cells, columns::WAREHOUSING)?.unwrap_or(0.0);
        components.pick_pack = self.number(cells, columns::PICK_PACK)?.unwrap_or(0.0);
        components.insurance = self.number(cells, columns::INSURANCE)?.unwrap_or(0.0);
        components.quality_control = self.number(cells, columns::QUALITY_CONTROL)?.unwrap_or(0.0);

        if let Some(gift_sku) = self.cell(cells, columns::GIFT_SKU) {
            inputs.gift = Some(GiftAttach {
                gift_sku: gift_sku.to_string(),
                gift_cost: self.number(cells, columns::GIFT_COST)?.unwrap_or(0.0),
                funding_share: self.number(cells, columns::GIFT_FUNDING_SHARE)?.unwrap_or(0.0),
                shipping_increment: self
                    .number(cells, columns::GIFT_SHIPPING_INCREMENT)?
                    .unwrap_or(0.0),
                attach_rate: self.number(cells, columns::GIFT_ATTACH_RATE)?.unwrap_or(1.0),
            });
        }

        inputs.net_content_ml = self.number(cells, columns::NET_CONTENT_ML)?;
        inputs.weight_g = self.number(cells, columns::WEIGHT_G)?;
        inputs.size_tier = self.cell(cells, columns::SIZE_TIER).map(str::to_string);
        inputs.referral_pct_override = self.number(cells, columns::REFERRAL_PCT_OVERRIDE)?;
        inputs.uvp_override_gross = self.number(cells, columns::UVP_OVERRIDE_GROSS)?;

        let mut extra = BTreeMap::new();
        for (position, header) in self.headers.iter().enumerate() {
            if !is_known(header) {
                extra
                    .entry(header.clone())
                    .or_insert_with(|| cells.get(position).cloned().unwrap_or_default());
            }
        }

        Ok(ProductRow {
            sheet_row,
            inputs,
            extra,
        })
    }

    /// Write a priced row back into its cells: output columns from the
    /// breakdown, unknown columns from the row's side table. Input cells keep
    /// their original text.
    pub fn write_priced(
        &self,
        cells: &mut Vec<String>,
        row: &ProductRow,
        breakdown: &PricingBreakdown,
    ) {
        if cells.len() < self.headers.len() {
            cells.resize(self.headers.len(), String::new());
        }
        for (header, value) in &row.extra {
            if let Some(&position) = self.positions.get(&key(header)) {
                cells[position].clone_from(value);
            }
        }
        for (column, value) in priced_cells(breakdown) {
            if let Some(&position) = self.positions.get(&key(column)) {
                cells[position] = value;
            }
        }
    }
}

/// Accepts `12.50`, `12,50`, `1,234.50`, `1.234,50` and `€12.50`. With both
/// separators present the last one is the decimal point. A lone separator
/// followed by exactly three digits (`1.234`) could be either and is rejected.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().trim_start_matches('€').trim_end_matches('%').trim();
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (None, None) => cleaned.to_string(),
        (Some(comma), Some(dot)) => {
            let (decimal, thousands) = if comma > dot { (',', '.') } else { ('.', ',') };
            let (whole, fraction) = cleaned.rsplit_once(decimal)?;
            if !is_grouped(whole, thousands) {
                return None;
            }
            format!("{}.{}", whole.replace(thousands, ""), fraction)
        }
        (Some(_), None) => single_separator(cleaned, ',')?,
        (None, Some(_)) => single_separator(cleaned, '.')?,
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One separator kind only: repeated it groups thousands, once it is a decimal point.
fn single_separator(cleaned: &str, separator: char) -> Option<String> {
    if cleaned.matches(separator).count() > 1 {
        return is_grouped(cleaned, separator).then(|| cleaned.replace(separator, ""));
    }

    let (whole, fraction) = cleaned.split_once(separator)?;
    let digits = whole.trim_start_matches('-');
    let ambiguous = fraction.len() == 3
        && fraction.chars().all(|c| c.is_ascii_digit())
        && (1..=3).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && digits != "0";
    if ambiguous {
        return None;
    }
    Some(format!("{}.{}", whole, fraction))
}

/// `1.234.567`: a leading group of one to three digits, then groups of three
fn is_grouped(whole: &str, separator: char) -> bool {
    let mut groups = whole.trim_start_matches('-').split(separator);
    let leading_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.chars().all(|c| c.is_ascii_digit()));
    leading_ok && groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

fn priced_cells(breakdown: &PricingBreakdown) -> Vec<(&'static str, String)> {
    let margin = |kind: ChannelKind| {
        breakdown
            .channel(kind)
            .map(|c| format_amount(c.margin_pct))
            .unwrap_or_default()
    };
    let guardrail = |kind: ChannelKind| match breakdown.channel(kind) {
        Some(c) if c.guardrail_passed => "PASS".to_string(),
        Some(_) => "FAIL".to_string(),
        None => String::new(),
    };
    let partner = |tier: PartnerTier| {
        breakdown
            .partner(tier)
            .map(|p| format_amount(p.net_price))
            .unwrap_or_default()
    };
    let bonus = breakdown
        .partner(PartnerTier::StandPartner)
        .and_then(|p| p.bonus)
        .map(format_amount)
        .unwrap_or_default();
    let notes = breakdown
        .guardrail_violations
        .iter()
        .chain(breakdown.warnings.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");

    vec![
        (columns::FULL_COST, format_amount(breakdown.cost.full_cost)),
        (columns::UVP_NET, format_amount(breakdown.uvp.net)),
        (columns::UVP_GROSS, format_amount(breakdown.uvp.gross)),
        (columns::GRUNDPREIS, breakdown.grundpreis.to_string()),
        (columns::FLOOR_NET, format_amount(breakdown.floor_net)),
        (columns::DIRECT_MARGIN, margin(ChannelKind::Direct)),
        (columns::DIRECT_GUARDRAIL, guardrail(ChannelKind::Direct)),
        (columns::MARKETPLACE_MARGIN, margin(ChannelKind::Marketplace)),
        (columns::MARKETPLACE_GUARDRAIL, guardrail(ChannelKind::Marketplace)),
        (columns::DEALER_BASIC, partner(PartnerTier::DealerBasic)),
        (columns::DEALER_PLUS, partner(PartnerTier::DealerPlus)),
        (columns::STAND_PARTNER, partner(PartnerTier::StandPartner)),
        (columns::STAND_PARTNER_BONUS, bonus),
        (columns::DISTRIBUTOR, partner(PartnerTier::Distributor)),
        (columns::PRICING_WARNINGS, notes),
    ]
}
