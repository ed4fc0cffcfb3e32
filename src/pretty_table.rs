use crate::models::{Product, ProductDetail, Trade, TradeListing, TradeStatus};
use chrono::DateTime;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| {
            Cell::new(t)
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Center)
        })
        .collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160)
        .set_header(header(titles));
    table
}

fn date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn status_cell(status: TradeStatus) -> Cell {
    let cell = Cell::new(status.to_string()).set_alignment(CellAlignment::Center);
    match status {
        TradeStatus::Pending => cell.fg(Color::Yellow),
        TradeStatus::Accepted => cell.fg(Color::Green),
        TradeStatus::Rejected | TradeStatus::Cancelled => cell.fg(Color::Red),
    }
}

pub fn print_products_table(products: &[Product]) -> String {
    let mut table = new_table(&[
        "Id", "Name", "Condition", "Value", "City", "State", "Tags", "Status", "Listed",
    ]);

    if products.is_empty() {
        table.add_row(vec![Cell::new("No products found")]);
    }
    for p in products {
        table.add_row(vec![
            Cell::new(p.id).set_alignment(CellAlignment::Center),
            Cell::new(&p.name),
            Cell::new(p.condition.to_string()).set_alignment(CellAlignment::Center),
            Cell::new(p.value).set_alignment(CellAlignment::Right),
            Cell::new(&p.city),
            Cell::new(&p.state).set_alignment(CellAlignment::Center),
            Cell::new(p.tags.join(", ")),
            Cell::new(p.status.to_string()).set_alignment(CellAlignment::Center),
            Cell::new(date(p.created_at)),
        ]);
    }

    table.to_string()
}

pub fn print_product_detail(detail: &ProductDetail) -> String {
    let p = &detail.product;
    let mut table = new_table(&["Field", "Value"]);
    let reputation = match detail.owner_reputation {
        0 => "not rated".to_string(),
        r => format!("{r}/5"),
    };

    let rows: Vec<(&str, String)> = vec![
        ("Id", p.id.to_string()),
        ("Name", p.name.clone()),
        ("Description", p.description.clone().unwrap_or_default()),
        ("Condition", p.condition.to_string()),
        ("Value", p.value.to_string()),
        ("Location", format!("{} - {}", p.city, p.state)),
        ("Tags", p.tags.join(", ")),
        ("Photos", p.photos.join("\n")),
        ("Status", p.status.to_string()),
        ("Owner", p.user_id.to_string()),
        ("Owner reputation", reputation),
    ];
    for (field, value) in rows {
        table.add_row(vec![Cell::new(field).add_attribute(Attribute::Bold), Cell::new(value)]);
    }

    table.to_string()
}

pub fn print_trade(trade: &Trade) -> String {
    let mut table = new_table(&[
        "Id", "Proposer", "Wants", "Offers", "Message", "Status", "Updated",
    ]);
    table.add_row(vec![
        Cell::new(trade.id).set_alignment(CellAlignment::Center),
        Cell::new(trade.proposer_id).set_alignment(CellAlignment::Center),
        Cell::new(trade.product_id).set_alignment(CellAlignment::Center),
        Cell::new(trade.offered_product_id).set_alignment(CellAlignment::Center),
        Cell::new(trade.message.as_deref().unwrap_or("")),
        status_cell(trade.status),
        Cell::new(date(trade.updated_at)),
    ]);

    table.to_string()
}

pub fn print_trades_table(trades: &[TradeListing]) -> String {
    let mut table = new_table(&[
        "Id", "From", "To", "Wants", "Offers", "Message", "Status", "Updated",
    ]);

    if trades.is_empty() {
        table.add_row(vec![Cell::new("No trades found")]);
    }
    for t in trades {
        table.add_row(vec![
            Cell::new(t.id).set_alignment(CellAlignment::Center),
            Cell::new(t.sender_id).set_alignment(CellAlignment::Center),
            Cell::new(t.receiver_id).set_alignment(CellAlignment::Center),
            Cell::new(format!("#{} {} ({})", t.target.id, t.target.name, t.target.value)),
            Cell::new(format!("#{} {} ({})", t.offered.id, t.offered.name, t.offered.value)),
            Cell::new(t.message.as_deref().unwrap_or("")),
            status_cell(t.status),
            Cell::new(date(t.updated_at)),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ProductStatus, ProductSummary};

    fn product() -> Product {
        Product {
            id: 3,
            user_id: 1,
            name: "Guitar".to_string(),
            description: Some("Six strings".to_string()),
            condition: Condition::Marked,
            value: 250,
            city: "Recife".to_string(),
            state: "PE".to_string(),
            tags: vec!["music".to_string(), "books".to_string()],
            photos: vec!["/product-pictures/guitar.jpg".to_string()],
            status: ProductStatus::Available,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_products_table_lists_rows() {
        let table = print_products_table(&[product()]);
        assert!(table.contains("Guitar"));
        assert!(table.contains("music, books"));
        assert!(table.contains("2023-11-14"));

        let empty = print_products_table(&[]);
        assert!(empty.contains("No products found"));
    }

    #[test]
    fn test_product_detail_shows_reputation() {
        let unrated = print_product_detail(&ProductDetail {
            product: product(),
            owner_reputation: 0,
        });
        assert!(unrated.contains("not rated"));

        let rated = print_product_detail(&ProductDetail {
            product: product(),
            owner_reputation: 4,
        });
        assert!(rated.contains("4/5"));
    }

    #[test]
    fn test_trades_table_shows_both_sides() {
        let summary = |id: i64, name: &str| ProductSummary {
            id,
            name: name.to_string(),
            description: None,
            value: 10,
            photos: vec![],
        };
        let listing = TradeListing {
            id: 9,
            sender_id: 2,
            receiver_id: 1,
            message: Some("deal?".to_string()),
            status: TradeStatus::Pending,
            created_at: 0,
            updated_at: 0,
            target: summary(3, "Guitar"),
            offered: summary(4, "Amplifier"),
        };
        let table = print_trades_table(&[listing]);
        assert!(table.contains("#3 Guitar (10)"));
        assert!(table.contains("#4 Amplifier (10)"));
        assert!(table.contains("pending"));
    }
}
