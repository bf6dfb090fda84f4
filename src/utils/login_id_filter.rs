use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static LOGIN_ID_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(login_id: &str) -> String {
    login_id.trim().to_lowercase()
}

/// Whether a login id might be taken (false positives possible). A poisoned
/// lock answers "maybe" so the caller falls through to the database.
pub fn might_exist(login_id: &str) -> bool {
    let login_id = normalize(login_id);
    match LOGIN_ID_FILTER.read() {
        Ok(filter) => filter.contains(&login_id),
        Err(_) => true,
    }
}

pub fn insert(login_id: &str) {
    let login_id = normalize(login_id);
    if let Ok(mut filter) = LOGIN_ID_FILTER.write() {
        filter.add(&login_id);
    }
}

pub fn remove(login_id: &str) {
    let login_id = normalize(login_id);
    if let Ok(mut filter) = LOGIN_ID_FILTER.write() {
        filter.remove(&login_id);
    }
}

pub async fn warmup_login_id_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT login_id FROM staff").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (login_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&login_id));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch)?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch)?;
    }

    tracing::info!(total, "Login id filter warmup complete");
    Ok(())
}

fn insert_batch(login_ids: &[String]) -> Result<()> {
    let mut filter = LOGIN_ID_FILTER
        .write()
        .map_err(|_| anyhow!("login id filter lock poisoned"))?;

    for login_id in login_ids {
        filter.add(login_id);
    }
    Ok(())
}
