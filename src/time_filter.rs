use chrono::Datelike;
use log::debug;

use crate::model::{MonthlyOrder, Order};

/// Orders whose production ended in `year`, each tagged with its month.
///
/// Orders without a production end are excluded. An empty result is valid;
/// the pipeline turns it into a warning.
pub fn filter_year(orders: &[Order], year: i32) -> Vec<MonthlyOrder> {
    let selected = orders
        .iter()
        .filter_map(|order| {
            let date = order.production_end?;
            (date.year() == year).then(|| MonthlyOrder {
                order_id: order.order_id.clone(),
                month: date.month(),
            })
        })
        .collect::<Vec<_>>();
    debug!(
        "{} of {} order(s) finished production in {year}",
        selected.len(),
        orders.len()
    );
    selected
}
