use std::sync::OnceLock;

use chrono::Utc;
use rand::RngExt;
use regex::Regex;
use rusqlite::params;
use uuid::Uuid;

use super::*;

/// Kenyan mobile format: +254 followed by nine digits.
fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+254[0-9]{9}$").expect("phone regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

const CUSTOMER_COLUMNS: &str = "id, account_id, customer_id, first_name, last_name, email, phone,
        gender, customer_type, status, address, city, county, country, postal_code,
        company_name, job_title, industry, notes, tags, is_primary_contact,
        created_at, updated_at, last_contacted";

impl CrmDb {
    /// Helper: map a row to `DbCustomer`. Column order must match
    /// `CUSTOMER_COLUMNS`.
    pub(crate) fn map_customer_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbCustomer> {
        Ok(DbCustomer {
            id: row.get(0)?,
            account_id: row.get(1)?,
            customer_id: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            gender: row
                .get::<_, Option<String>>(7)?
                .map(|g| Gender::from_str_lossy(&g)),
            customer_type: CustomerType::from_str_lossy(&row.get::<_, String>(8)?),
            status: CustomerStatus::from_str_lossy(&row.get::<_, String>(9)?),
            address: row.get(10)?,
            city: row.get(11)?,
            county: row.get(12)?,
            country: row.get(13)?,
            postal_code: row.get(14)?,
            company_name: row.get(15)?,
            job_title: row.get(16)?,
            industry: row.get(17)?,
            notes: row.get(18)?,
            tags: row.get(19)?,
            is_primary_contact: row.get::<_, i32>(20)? != 0,
            created_at: row.get(21)?,
            updated_at: row.get(22)?,
            last_contacted: row.get(23)?,
        })
    }

    /// Create a customer. Validates phone and email, generates the record id
    /// and the human-readable `customer_id` (`CUS` + 6 digits).
    pub fn create_customer(&self, input: &NewCustomer) -> Result<DbCustomer, DbError> {
        if !phone_regex().is_match(&input.phone) {
            return Err(DbError::Invalid(
                "Phone number must be in format +254XXXXXXXXX".to_string(),
            ));
        }
        if !email_regex().is_match(&input.email) {
            return Err(DbError::Invalid(format!(
                "'{}' is not a valid email address",
                input.email
            )));
        }

        let now = Utc::now().to_rfc3339();
        let customer = DbCustomer {
            id: Uuid::new_v4().to_string(),
            account_id: input.account_id.clone(),
            customer_id: String::new(), // assigned below
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            gender: input.gender,
            customer_type: input.customer_type.unwrap_or(CustomerType::Individual),
            status: input.status.unwrap_or(CustomerStatus::Prospect),
            address: input.address.clone(),
            city: input.city.clone(),
            county: input.county.clone(),
            country: input
                .country
                .clone()
                .unwrap_or_else(|| "Kenya".to_string()),
            postal_code: input.postal_code.clone(),
            company_name: input.company_name.clone(),
            job_title: input.job_title.clone(),
            industry: input.industry.clone(),
            notes: input.notes.clone(),
            tags: input.tags.clone(),
            is_primary_contact: input.is_primary_contact,
            created_at: now.clone(),
            updated_at: now,
            last_contacted: None,
        };

        // The generated customer_id is unique; retry on the rare collision.
        let mut rng = rand::rng();
        for _ in 0..5 {
            let candidate = format!("CUS{}", rng.random_range(100000..=999999));
            let result = self.conn.execute(
                "INSERT INTO customers (
                    id, account_id, customer_id, first_name, last_name, email, phone,
                    gender, customer_type, status, address, city, county, country,
                    postal_code, company_name, job_title, industry, notes, tags,
                    is_primary_contact, created_at, updated_at, last_contacted
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
                params![
                    customer.id,
                    customer.account_id,
                    candidate,
                    customer.first_name,
                    customer.last_name,
                    customer.email,
                    customer.phone,
                    customer.gender.map(|g| g.as_str()),
                    customer.customer_type.as_str(),
                    customer.status.as_str(),
                    customer.address,
                    customer.city,
                    customer.county,
                    customer.country,
                    customer.postal_code,
                    customer.company_name,
                    customer.job_title,
                    customer.industry,
                    customer.notes,
                    customer.tags,
                    customer.is_primary_contact as i32,
                    customer.created_at,
                    customer.updated_at,
                    customer.last_contacted,
                ],
            );
            match result {
                Ok(_) => {
                    return Ok(DbCustomer {
                        customer_id: candidate,
                        ..customer
                    })
                }
                Err(rusqlite::Error::SqliteFailure(e, Some(msg)))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation
                        && msg.contains("customers.customer_id") =>
                {
                    log::warn!("customer_id collision on {}, retrying", candidate);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DbError::Invalid(
            "Could not allocate a unique customer id".to_string(),
        ))
    }

    /// Get a customer by id, scoped to the owning account.
    pub fn get_customer(&self, account_id: &str, id: &str) -> Result<Option<DbCustomer>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1 AND account_id = ?2"
        ))?;
        let mut rows = stmt.query_map(params![id, account_id], Self::map_customer_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Most recently created customers for an account, newest first.
    pub fn recent_customers(
        &self,
        account_id: &str,
        limit: i64,
    ) -> Result<Vec<DbCustomer>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE account_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![account_id, limit], Self::map_customer_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Count an account's customers created at or after `since` (RFC 3339).
    pub fn count_customers_since(&self, account_id: &str, since: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM customers WHERE account_id = ?1 AND created_at >= ?2",
            params![account_id, since],
            |row| row.get(0),
        )?)
    }

    /// Creation timestamps for an account's customers since `since`.
    /// Feeds the analytics day series; bucketing happens in the composer.
    pub fn customer_created_times_since(
        &self,
        account_id: &str,
        since: &str,
    ) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT created_at FROM customers
             WHERE account_id = ?1 AND created_at >= ?2
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![account_id, since], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Total customer count across all accounts. Snapshot recomputation only.
    pub fn count_customers(&self) -> Result<i64, DbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?)
    }

    /// Customers created on a given UTC calendar date, across all accounts.
    /// Snapshot recomputation only.
    pub fn count_customers_created_on(&self, date: &str) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM customers WHERE substr(created_at, 1, 10) = ?1",
            params![date],
            |row| row.get(0),
        )?)
    }

    /// Update a customer's mutable fields. `customer_id`, `account_id`, and
    /// `created_at` are never touched.
    pub fn update_customer(&self, customer: &DbCustomer) -> Result<(), DbError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE customers SET
                first_name = ?1, last_name = ?2, email = ?3, phone = ?4,
                gender = ?5, customer_type = ?6, status = ?7, address = ?8,
                city = ?9, county = ?10, country = ?11, postal_code = ?12,
                company_name = ?13, job_title = ?14, industry = ?15,
                notes = ?16, tags = ?17, is_primary_contact = ?18, updated_at = ?19
             WHERE id = ?20 AND account_id = ?21",
            params![
                customer.first_name,
                customer.last_name,
                customer.email,
                customer.phone,
                customer.gender.map(|g| g.as_str()),
                customer.customer_type.as_str(),
                customer.status.as_str(),
                customer.address,
                customer.city,
                customer.county,
                customer.country,
                customer.postal_code,
                customer.company_name,
                customer.job_title,
                customer.industry,
                customer.notes,
                customer.tags,
                customer.is_primary_contact as i32,
                now,
                customer.id,
                customer.account_id,
            ],
        )?;
        Ok(())
    }

    /// Stamp a customer's last_contacted with the current time.
    /// Returns false when no matching customer exists for the account.
    pub fn touch_customer_last_contacted(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE customers SET last_contacted = ?1, updated_at = ?1
             WHERE id = ?2 AND account_id = ?3",
            params![now, id, account_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_db;
    use super::*;

    fn sample_customer(account_id: &str, email: &str) -> NewCustomer {
        NewCustomer {
            account_id: account_id.to_string(),
            first_name: "Wanjiku".to_string(),
            last_name: "Kamau".to_string(),
            email: email.to_string(),
            phone: "+254712345678".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_generates_ids_and_defaults() {
        let db = test_db();
        let customer = db
            .create_customer(&sample_customer("acct-1", "wanjiku@example.com"))
            .expect("create");

        assert!(!customer.id.is_empty());
        assert!(customer.customer_id.starts_with("CUS"));
        assert_eq!(customer.customer_id.len(), 9);
        assert_eq!(customer.customer_type, CustomerType::Individual);
        assert_eq!(customer.status, CustomerStatus::Prospect);
        assert_eq!(customer.country, "Kenya");
        assert_eq!(customer.full_name(), "Wanjiku Kamau");

        let fetched = db
            .get_customer("acct-1", &customer.id)
            .expect("get")
            .expect("exists");
        assert_eq!(fetched.customer_id, customer.customer_id);
    }

    #[test]
    fn test_create_rejects_bad_phone() {
        let db = test_db();
        let mut input = sample_customer("acct-1", "a@example.com");
        input.phone = "0712345678".to_string();
        let err = db.create_customer(&input).expect_err("should fail");
        assert!(matches!(err, DbError::Invalid(_)));

        input.phone = "+254712345".to_string(); // too short
        assert!(db.create_customer(&input).is_err());
    }

    #[test]
    fn test_create_rejects_bad_email() {
        let db = test_db();
        let mut input = sample_customer("acct-1", "not-an-email");
        let err = db.create_customer(&input).expect_err("should fail");
        assert!(matches!(err, DbError::Invalid(_)));

        input.email = "a@b".to_string();
        assert!(db.create_customer(&input).is_err());
    }

    #[test]
    fn test_get_customer_scoped_to_account() {
        let db = test_db();
        let customer = db
            .create_customer(&sample_customer("acct-1", "a@example.com"))
            .expect("create");

        let other = db.get_customer("acct-2", &customer.id).expect("get");
        assert!(other.is_none(), "cross-account read must return nothing");
    }

    #[test]
    fn test_recent_customers_cap_and_order() {
        let db = test_db();
        for i in 0..7 {
            db.conn_ref()
                .execute(
                    "INSERT INTO customers (id, account_id, customer_id, first_name,
                        last_name, email, phone, customer_type, status, country,
                        is_primary_contact, created_at, updated_at)
                     VALUES (?1, 'acct-1', ?2, 'C', ?3, ?4, '+254700000000',
                        'individual', 'prospect', 'Kenya', 0, ?5, ?5)",
                    params![
                        format!("cust-{i}"),
                        format!("CUS10000{i}"),
                        format!("Number{i}"),
                        format!("c{i}@example.com"),
                        format!("2026-01-0{}T00:00:00+00:00", i + 1),
                    ],
                )
                .expect("insert");
        }

        let recent = db.recent_customers("acct-1", 5).expect("query");
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, "cust-6", "newest first");
        assert_eq!(recent[4].id, "cust-2");
    }

    #[test]
    fn test_customer_id_immutable_across_updates() {
        let db = test_db();
        let mut customer = db
            .create_customer(&sample_customer("acct-1", "a@example.com"))
            .expect("create");
        let original_cid = customer.customer_id.clone();

        customer.first_name = "Atieno".to_string();
        customer.customer_id = "CUS999999".to_string(); // must be ignored
        db.update_customer(&customer).expect("update");

        let fetched = db
            .get_customer("acct-1", &customer.id)
            .expect("get")
            .expect("exists");
        assert_eq!(fetched.first_name, "Atieno");
        assert_eq!(fetched.customer_id, original_cid);
    }

    #[test]
    fn test_count_customers_since() {
        let db = test_db();
        db.conn_ref()
            .execute(
                "INSERT INTO customers (id, account_id, customer_id, first_name,
                    last_name, email, phone, customer_type, status, country,
                    is_primary_contact, created_at, updated_at)
                 VALUES ('old', 'acct-1', 'CUS100001', 'Old', 'One', 'old@example.com',
                    '+254700000000', 'individual', 'prospect', 'Kenya', 0,
                    '2020-01-01T00:00:00+00:00', '2020-01-01T00:00:00+00:00')",
                [],
            )
            .expect("insert old");
        db.create_customer(&sample_customer("acct-1", "new@example.com"))
            .expect("create new");

        let count = db
            .count_customers_since("acct-1", "2025-01-01T00:00:00+00:00")
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_touch_last_contacted() {
        let db = test_db();
        let customer = db
            .create_customer(&sample_customer("acct-1", "a@example.com"))
            .expect("create");
        assert!(customer.last_contacted.is_none());

        let matched = db
            .touch_customer_last_contacted("acct-1", &customer.id)
            .expect("touch");
        assert!(matched);

        let fetched = db
            .get_customer("acct-1", &customer.id)
            .expect("get")
            .expect("exists");
        assert!(fetched.last_contacted.is_some());

        // Wrong account must not match
        let miss = db
            .touch_customer_last_contacted("acct-2", &customer.id)
            .expect("touch");
        assert!(!miss);
    }
}
