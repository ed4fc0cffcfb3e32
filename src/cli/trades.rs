use crate::error::{CantDoReason, Result};
use crate::models::{NewTrade, User};
use crate::pretty_table::{print_trade, print_trades_table};
use crate::service::Marketplace;

pub async fn execute_propose(
    proposer: &User,
    product_id: Option<i64>,
    offered_product_id: Option<i64>,
    message: &Option<String>,
    market: &Marketplace,
) -> Result<()> {
    let proposal = NewTrade {
        proposer_id: Some(proposer.id),
        product_id,
        offered_product_id,
        message: message.clone(),
    };
    let trade = market.propose_trade(&proposal).await?;
    println!("Trade {} proposed", trade.id);
    println!("{}", print_trade(&trade));

    Ok(())
}

pub async fn execute_trades(market: &Marketplace) -> Result<()> {
    let trades = market.list_trades().await?;
    println!("{}", print_trades_table(&trades));

    Ok(())
}

pub async fn execute_trade(trade_id: i64, market: &Marketplace) -> Result<()> {
    let trade = market.get_trade(trade_id).await?;
    println!("{}", print_trade(&trade));

    Ok(())
}

/// Owner of the product the trade asks for
async fn recipient_of(trade_id: i64, market: &Marketplace) -> Result<i64> {
    let trade = market.get_trade(trade_id).await?;
    let target = market.get_product(trade.product_id).await?;
    Ok(target.product.user_id)
}

pub async fn execute_cancel(actor: &User, trade_id: i64, market: &Marketplace) -> Result<()> {
    if market.get_trade(trade_id).await?.proposer_id != actor.id {
        return Err(CantDoReason::Unauthorized.into());
    }
    let trade = market.cancel_trade(trade_id).await?;
    println!("Trade {} cancelled", trade.id);

    Ok(())
}

pub async fn execute_reject(actor: &User, trade_id: i64, market: &Marketplace) -> Result<()> {
    if recipient_of(trade_id, market).await? != actor.id {
        return Err(CantDoReason::Unauthorized.into());
    }
    let trade = market.reject_trade(trade_id).await?;
    println!("Trade {} rejected", trade.id);

    Ok(())
}

pub async fn execute_accept(
    actor: &User,
    trade_id: i64,
    rating: i64,
    market: &Marketplace,
) -> Result<()> {
    if recipient_of(trade_id, market).await? != actor.id {
        return Err(CantDoReason::Unauthorized.into());
    }
    let trade = market.get_trade(trade_id).await?;
    market.accept_trade(trade_id, trade.proposer_id, rating).await?;
    println!(
        "Trade {trade_id} accepted, user {} rated {rating}/5",
        trade.proposer_id
    );

    Ok(())
}
