use crate::error::Result;
use crate::models::{NewProduct, ProductFilter};
use crate::pretty_table::{print_product_detail, print_products_table};
use crate::service::Marketplace;

pub async fn execute_list_product(listing: &NewProduct, market: &Marketplace) -> Result<()> {
    let product = market.create_product(listing).await?;
    println!("Listed product {} with id {}", product.name, product.id);
    println!("{}", print_products_table(&[product]));

    Ok(())
}

pub async fn execute_products(market: &Marketplace) -> Result<()> {
    let products = market.list_available_products().await?;
    println!("{}", print_products_table(&products));

    Ok(())
}

pub async fn execute_product(product_id: i64, market: &Marketplace) -> Result<()> {
    let detail = market.get_product(product_id).await?;
    println!("{}", print_product_detail(&detail));

    Ok(())
}

pub async fn execute_filter(
    name: &Option<String>,
    city: &Option<String>,
    state: &Option<String>,
    min: Option<i64>,
    max: Option<i64>,
    market: &Marketplace,
) -> Result<()> {
    let filter = ProductFilter {
        name: name.clone(),
        city: city.clone(),
        state: state.clone(),
        min_value: min,
        max_value: max,
    };
    let products = market.filter_products(&filter).await?;
    println!("{}", print_products_table(&products));

    Ok(())
}

pub async fn execute_user_products(user_id: i64, market: &Marketplace) -> Result<()> {
    let products = market.list_user_products(user_id).await?;
    println!("Products of user {user_id}");
    println!("{}", print_products_table(&products));

    Ok(())
}
