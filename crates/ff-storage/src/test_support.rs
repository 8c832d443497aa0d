// SPDX-License-Identifier: MIT

//! Test-only helper for spinning up a migrated in-memory database.

use crate::Store;

pub async fn test_store() -> Store {
    let pool = crate::connect("sqlite::memory:").await.expect("migrate in-memory db");
    Store::new(pool)
}
