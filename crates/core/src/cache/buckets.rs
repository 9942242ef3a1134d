//! Bucket and entry operations on the SQLite store.

use super::connection::CacheDb;
use super::hash::request_key;
use super::{CacheEntry, CacheStorage, EntrySummary};
use crate::{Error, Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Entry row prepared outside the connection thread.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    final_url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(entry: &CacheEntry) -> Result<Self, Error> {
        Ok(Self {
            key_hash: request_key(&entry.request),
            method: entry.request.method.clone(),
            url: entry.request.url.to_string(),
            final_url: entry.response.url.to_string(),
            status: entry.response.status,
            headers_json: serde_json::to_string(&entry.response.headers)?,
            body: entry.response.body.to_vec(),
        })
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO buckets (name, created_at) VALUES (?1, ?2)
                    ON CONFLICT(name) DO NOTHING",
                    params![bucket, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)",
                    params![bucket],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![bucket])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_entry(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let bucket = bucket.to_string();
        let key_hash = request_key(request);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, u16, String, Vec<u8>)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT final_url, status, headers_json, body
                    FROM entries WHERE bucket = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![bucket, key_hash], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((final_url, status, headers_json, body)) = row else {
            return Ok(None);
        };

        let url = Url::parse(&final_url).map_err(|e| Error::Storage(format!("stored url {final_url}: {e}")))?;
        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;

        Ok(Some(Response { url, status, headers, body: body.into() }))
    }

    async fn put_all(&self, bucket: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        let rows = entries.iter().map(EntryRow::encode).collect::<Result<Vec<_>, _>>()?;
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO buckets (name, created_at) VALUES (?1, ?2)
                    ON CONFLICT(name) DO NOTHING",
                    params![&bucket, &now],
                )?;

                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO entries (
                        bucket, key_hash, method, url, final_url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(bucket, key_hash) DO UPDATE SET
                        final_url = excluded.final_url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    )?;

                    for row in &rows {
                        stmt.execute(params![
                            &bucket,
                            &row.key_hash,
                            &row.method,
                            &row.url,
                            &row.final_url,
                            row.status,
                            &row.headers_json,
                            &row.body,
                            &now,
                        ])?;
                    }
                }

                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, bucket: &str) -> Result<Vec<EntrySummary>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, LENGTH(body), stored_at
                    FROM entries WHERE bucket = ?1 ORDER BY rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![bucket], |row| {
                        Ok(EntrySummary {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            size: row.get::<_, i64>(3)? as usize,
                            stored_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}
