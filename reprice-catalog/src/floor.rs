/// Minimum permissible net price for a line: full cost × the line's multiplier.
pub fn floor_net(full_cost: f64, floor_multiplier: f64) -> f64 {
    full_cost * floor_multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{LineParameters, LineTable, ProductLine};

    #[test]
    fn test_floor_is_cost_times_multiplier() {
        let table = LineTable::<LineParameters>::default();
        let all = [
            ProductLine::Premium,
            ProductLine::Basic,
            ProductLine::Tools,
            ProductLine::Other,
        ];
        for line in all {
            let multiplier = table.get(line).floor_multiplier;
            assert_eq!(floor_net(10.0, multiplier), 10.0 * multiplier);
        }
        assert_eq!(floor_net(10.0, 2.1), 21.0);
    }
}
