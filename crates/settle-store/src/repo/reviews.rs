use crate::error::Result;
use crate::repo::{parse_booking_id, parse_review_id, parse_user_id};
use rusqlite::{params, Connection};
use settle_core::domain::{BookingId, Review, UserId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub count: i64,
    pub average: f64,
}

pub struct ReviewsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ReviewsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get_for_booking(&self, booking_id: BookingId) -> Result<Option<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, booking_id, customer_id, settler_id, rating, comment, created_at
             FROM reviews WHERE booking_id = ?1;",
        )?;
        let mut rows = stmt.query([booking_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(review_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn list_for_settler(&self, settler_id: &UserId) -> Result<Vec<Review>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, booking_id, customer_id, settler_id, rating, comment, created_at
             FROM reviews
             WHERE settler_id = ?1
             ORDER BY created_at DESC, id ASC;",
        )?;
        let mut rows = stmt.query([settler_id.as_str()])?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(review_from_row(row)?);
        }
        Ok(reviews)
    }

    pub fn summary_for_settler(&self, settler_id: &UserId) -> Result<Option<RatingSummary>> {
        let (count, average): (i64, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), AVG(rating) FROM reviews WHERE settler_id = ?1;",
            [settler_id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(average
            .filter(|_| count > 0)
            .map(|average| RatingSummary { count, average }))
    }
}

pub(crate) fn insert_review(conn: &Connection, review: &Review) -> Result<()> {
    conn.execute(
        "INSERT INTO reviews (id, booking_id, customer_id, settler_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            review.id.to_string(),
            review.booking_id.to_string(),
            review.customer_id.as_str(),
            review.settler_id.as_str(),
            review.rating,
            review.comment,
            review.created_at,
        ],
    )?;
    Ok(())
}

fn review_from_row(row: &rusqlite::Row<'_>) -> Result<Review> {
    let id: String = row.get(0)?;
    let booking_id: String = row.get(1)?;
    let customer_id: String = row.get(2)?;
    let settler_id: String = row.get(3)?;
    Ok(Review {
        id: parse_review_id(&id)?,
        booking_id: parse_booking_id(&booking_id)?,
        customer_id: parse_user_id(&customer_id)?,
        settler_id: parse_user_id(&settler_id)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
    })
}
