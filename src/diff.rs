use crate::models::{DeltaRecord, FullSnapshot};

/// Products in `new` that `old` has never seen, in `new`'s iteration order.
///
/// Only vendor/category pairs already present in `old` can produce deltas. A vendor
/// or category seen for the first time is taken as the baseline and reports nothing,
/// so adding a source to the config does not flood the channel. Removed products are
/// never reported.
pub fn diff(old: &FullSnapshot, new: &FullSnapshot) -> Vec<DeltaRecord> {
    let mut deltas = Vec::new();

    for (vendor, categories) in new {
        let Some(old_categories) = old.get(vendor) else {
            continue;
        };

        for (category, products) in categories {
            let Some(old_products) = old_categories.get(category) else {
                continue;
            };

            for (name, record) in products {
                if old_products.contains_key(name) {
                    continue;
                }
                deltas.push(DeltaRecord {
                    vendor: vendor.clone(),
                    category: category.clone(),
                    title: name.clone(),
                    image: record.image_url.clone(),
                    price: record.price,
                    url: record.url.clone(),
                });
            }
        }
    }

    deltas
}
