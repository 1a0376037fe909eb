use serde::{Deserialize, Serialize};

/// Product lines with their own margin, floor and channel-cost parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductLine {
    Premium,
    Basic,
    Tools,
    /// Any line label the parameter table does not name
    Other,
}

impl ProductLine {
    /// Parse a line label from the catalog. Unknown labels fall back to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "premium" => ProductLine::Premium,
            "basic" => ProductLine::Basic,
            "tools" => ProductLine::Tools,
            _ => ProductLine::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductLine::Premium => "premium",
            ProductLine::Basic => "basic",
            ProductLine::Tools => "tools",
            ProductLine::Other => "other",
        }
    }
}

/// One value per named line plus the default row used for `Other`.
///
/// Built once when the parameters are loaded, so lookups never miss. A
/// source that omits a line gets that line's default row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, bound(deserialize = "T: Deserialize<'de>, LineTable<T>: Default"))]
pub struct LineTable<T> {
    pub premium: T,
    pub basic: T,
    pub tools: T,
    pub default: T,
}

impl<T> LineTable<T> {
    pub fn get(&self, line: ProductLine) -> &T {
        match line {
            ProductLine::Premium => &self.premium,
            ProductLine::Basic => &self.basic,
            ProductLine::Tools => &self.tools,
            ProductLine::Other => &self.default,
        }
    }
}

/// Per-line pricing parameters. Percentages are whole percent (45.0 = 45 %).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineParameters {
    /// Target margin on net retail price
    pub target_margin_pct: f64,

    /// Floor net = full cost × multiplier
    pub floor_multiplier: f64,

    pub ad_pct: f64,
    pub returns_pct: f64,
    pub loyalty_pct: f64,
    pub payment_pct: f64,
}

impl LineParameters {
    /// Sum of the gross-based direct-channel percentages
    pub fn direct_cost_pct(&self) -> f64 {
        self.ad_pct + self.returns_pct + self.loyalty_pct + self.payment_pct
    }
}

impl Default for LineTable<LineParameters> {
    fn default() -> Self {
        Self {
            premium: LineParameters {
                target_margin_pct: 60.0,
                floor_multiplier: 2.5,
                ad_pct: 8.0,
                returns_pct: 3.0,
                loyalty_pct: 2.0,
                payment_pct: 2.5,
            },
            basic: LineParameters {
                target_margin_pct: 50.0,
                floor_multiplier: 2.1,
                ad_pct: 6.0,
                returns_pct: 3.0,
                loyalty_pct: 2.0,
                payment_pct: 2.5,
            },
            tools: LineParameters {
                target_margin_pct: 45.0,
                floor_multiplier: 1.8,
                ad_pct: 5.0,
                returns_pct: 2.0,
                loyalty_pct: 1.0,
                payment_pct: 2.5,
            },
            default: LineParameters {
                target_margin_pct: 50.0,
                floor_multiplier: 2.0,
                ad_pct: 6.0,
                returns_pct: 3.0,
                loyalty_pct: 2.0,
                payment_pct: 2.5,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_labels() {
        assert_eq!(ProductLine::from_label(" Premium "), ProductLine::Premium);
        assert_eq!(ProductLine::from_label("TOOLS"), ProductLine::Tools);
        assert_eq!(ProductLine::from_label("seasonal"), ProductLine::Other);
    }

    #[test]
    fn test_unknown_line_uses_default_row() {
        let table = LineTable::<LineParameters>::default();
        assert_eq!(table.get(ProductLine::Other), &table.default);
        assert!(
            table.get(ProductLine::Premium).floor_multiplier
                > table.get(ProductLine::Tools).floor_multiplier
        );
    }

    #[test]
    fn test_omitted_lines_fall_back_to_defaults() {
        let table: LineTable<LineParameters> = serde_json::from_value(serde_json::json!({
            "premium": {
                "target_margin_pct": 65.0,
                "floor_multiplier": 3.0,
                "ad_pct": 8.0,
                "returns_pct": 3.0,
                "loyalty_pct": 2.0,
                "payment_pct": 2.5
            }
        }))
        .unwrap();

        let defaults = LineTable::<LineParameters>::default();
        assert_eq!(table.premium.target_margin_pct, 65.0);
        assert_eq!(table.basic, defaults.basic);
        assert_eq!(table.tools, defaults.tools);
        assert_eq!(table.default, defaults.default);
    }
}
