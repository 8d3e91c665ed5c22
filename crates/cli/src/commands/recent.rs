//! Recently viewed products.

use bestie_storefront::RecentlyViewed;

use super::App;
use crate::output;

/// Print the recently viewed products, most recent first.
pub fn list(app: &App) {
    let products = RecentlyViewed::new(app.storage.clone()).list();
    output::products(&products, app.currency());
}
