use crate::error::{Result, StoreError};
use crate::repo::{
    parse_activity_kind, parse_booking_id, parse_evidence_kind, parse_role, parse_status,
    parse_user_id, reviews, uploads,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use settle_core::domain::{
    Acceptor, ActivityId, Actor, Addon, Booking, BookingActivity, BookingId, BookingStatus,
    Cancellation, Evidence, EvidenceKind, ManualQuote, Pricing, QuoteProposal, Review, UserId,
};
use settle_core::rules::{
    apply, replay, timeline, BookingEvent, Expectation, LifecyclePolicy, TransitionRequest,
};
use settle_core::CoreError;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{info, warn};

const SCOPE_PRICING: &str = "pricing";
const SCOPE_PROPOSAL: &str = "proposal";

#[derive(Debug, Clone)]
pub struct BookingNew {
    pub customer_id: UserId,
    pub base_price_cents: i64,
    pub addons: Vec<Addon>,
    pub manual_quote: Option<ManualQuote>,
}

/// Equality filters; `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub customer_id: Option<UserId>,
    pub settler_id: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct CommittedTransition {
    pub from: BookingStatus,
    pub booking: Booking,
    pub activity: BookingActivity,
    pub review: Option<Review>,
    /// The request id had already been committed; nothing was written.
    pub replayed: bool,
}

pub struct BookingsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> BookingsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, input: BookingNew) -> Result<Booking> {
        let pricing = Pricing::new(input.base_price_cents, input.addons, input.manual_quote)?;
        let booking = Booking::new(BookingId::new(), input.customer_id, pricing, now_utc);
        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction()?;
            insert_booking(&tx, &booking)?;
            tx.commit()?;
        } else {
            insert_booking(self.conn, &booking)?;
        }
        info!(booking = %booking.id, customer = %booking.customer_id, "booking created");
        Ok(booking)
    }

    pub fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        load_booking(self.conn, id)
    }

    pub fn require(&self, id: BookingId) -> Result<Booking> {
        self.get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn list(&self, query: &BookingQuery) -> Result<Vec<Booking>> {
        let ids: Vec<String> = {
            let mut stmt = self.conn.prepare(
                "SELECT id FROM bookings
                 WHERE (?1 IS NULL OR status_code = ?1)
                   AND (?2 IS NULL OR customer_id = ?2)
                   AND (?3 IS NULL OR settler_id = ?3)
                 ORDER BY created_at DESC, id ASC;",
            )?;
            let rows = stmt.query_map(
                params![
                    query.status.map(|status| status.code_tenths()),
                    query.customer_id.as_ref().map(UserId::as_str),
                    query.settler_id.as_ref().map(UserId::as_str),
                ],
                |row| row.get(0),
            )?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut bookings = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = parse_booking_id(&raw)?;
            if let Some(booking) = load_booking(self.conn, id)? {
                bookings.push(booking);
            }
        }
        Ok(bookings)
    }

    /// Runs one lifecycle transition as the single writer for `id`.
    ///
    /// The write lock is taken before the booking is read, so the guard and
    /// the write see the same row. A request id that is already on the
    /// timeline short-circuits to the committed result.
    pub fn transition(
        &self,
        now_utc: i64,
        id: BookingId,
        request: TransitionRequest,
        policy: &LifecyclePolicy,
    ) -> Result<CommittedTransition> {
        if self.conn.is_autocommit() {
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            let committed = transition_inner(&tx, now_utc, id, request, policy)?;
            tx.commit()?;
            Ok(committed)
        } else {
            transition_inner(self.conn, now_utc, id, request, policy)
        }
    }

    /// Completes every booking whose cooldown window has run out, one
    /// transaction per booking. Returns the ids that moved to completed.
    pub fn sweep_cooldowns(
        &self,
        now_utc: i64,
        policy: &LifecyclePolicy,
    ) -> Result<Vec<BookingId>> {
        let cutoff = now_utc.saturating_sub(policy.cooldown_secs);
        let ids: Vec<String> = {
            let mut stmt = self.conn.prepare(
                "SELECT id FROM bookings
                 WHERE status_code = ?1
                   AND COALESCE(cooldown_started_at, updated_at) <= ?2
                 ORDER BY COALESCE(cooldown_started_at, updated_at) ASC, id ASC;",
            )?;
            let rows = stmt.query_map(
                params![BookingStatus::Cooldown.code_tenths(), cutoff],
                |row| row.get(0),
            )?;
            rows.collect::<rusqlite::Result<_>>()?
        };

        let mut completed = Vec::new();
        for raw in ids {
            let id = parse_booking_id(&raw)?;
            let request = TransitionRequest::new(Actor::System, BookingEvent::CompleteCooldown)
                .expecting(Expectation::Status(BookingStatus::Cooldown));
            match self.transition(now_utc, id, request, policy) {
                Ok(_) => completed.push(id),
                Err(err)
                    if err.is_conflict()
                        || matches!(err.core(), Some(CoreError::CooldownNotElapsed(_))) =>
                {
                    warn!(booking = %id, error = %err, "cooldown sweep skipped booking");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(completed)
    }
}

fn transition_inner(
    conn: &Connection,
    now_utc: i64,
    id: BookingId,
    request: TransitionRequest,
    policy: &LifecyclePolicy,
) -> Result<CommittedTransition> {
    let before = load_booking(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    let committed = match replay(&before, &request) {
        Ok(found) => found.cloned(),
        Err(err) => {
            warn!(
                booking = %id,
                request_id = request.request_id.as_deref().unwrap_or_default(),
                error = %err,
                "request id refused"
            );
            return Err(err.into());
        }
    };
    if let Some(activity) = committed {
        warn!(
            booking = %id,
            request_id = request.request_id.as_deref().unwrap_or_default(),
            activity = %activity.kind,
            "request already committed, replaying result"
        );
        return Ok(replayed(before, activity));
    }

    let action = request.event.action();
    let image_urls = request.event.image_urls().to_vec();
    let transition = match apply(&before, request, policy, now_utc) {
        Ok(transition) => transition,
        Err(err) => {
            if matches!(err, CoreError::StaleTransition { .. }) {
                warn!(booking = %id, action = %action, error = %err, "stale transition refused");
            }
            return Err(err.into());
        }
    };

    if !timeline::is_extension_of(&before.timeline, &transition.booking.timeline) {
        return Err(StoreError::InvalidData(format!(
            "timeline of booking {} would be rewritten",
            id
        )));
    }

    write_booking_changes(conn, &before, &transition.booking)?;
    if let Some(review) = &transition.review {
        reviews::insert_review(conn, review)?;
    }
    let committed_uploads = uploads::commit_paths(conn, id, &image_urls, now_utc)?;

    info!(
        booking = %id,
        action = %action,
        from = %transition.from.code(),
        to = %transition.booking.status.code(),
        version = transition.booking.version,
        uploads = committed_uploads,
        "transition committed"
    );

    Ok(CommittedTransition {
        from: transition.from,
        booking: transition.booking,
        activity: transition.activity,
        review: transition.review,
        replayed: false,
    })
}

fn replayed(booking: Booking, activity: BookingActivity) -> CommittedTransition {
    let position = booking
        .timeline
        .iter()
        .position(|entry| entry.id == activity.id)
        .unwrap_or(0);
    let from = position
        .checked_sub(1)
        .and_then(|index| booking.timeline.get(index))
        .map(|entry| entry.status)
        .unwrap_or(BookingStatus::New);
    CommittedTransition {
        from,
        booking,
        activity,
        review: None,
        replayed: true,
    }
}

fn insert_booking(conn: &Connection, booking: &Booking) -> Result<()> {
    let quote = booking.pricing.manual_quote.as_ref();
    conn.execute(
        "INSERT INTO bookings (id, customer_id, settler_id, status_code, version,
                               service_start_code, base_price_cents, quote_description,
                               quote_price_cents, total_cents, created_at, updated_at)
         VALUES (?1, ?2, NULL, ?3, ?4, NULL, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            booking.id.to_string(),
            booking.customer_id.as_str(),
            booking.status.code_tenths(),
            booking.version,
            booking.pricing.base_price_cents,
            quote.map(|q| q.description.as_str()),
            quote.map(|q| q.price_cents),
            booking.pricing.total_cents,
            booking.created_at,
            booking.updated_at,
        ],
    )?;
    replace_addons(conn, booking.id, SCOPE_PRICING, &booking.pricing.addons)?;
    Ok(())
}

/// Persists the difference between two versions of the same aggregate.
/// Timeline, acceptors and cancel reasons only ever gain rows.
fn write_booking_changes(conn: &Connection, before: &Booking, after: &Booking) -> Result<()> {
    let quote = after.pricing.manual_quote.as_ref();
    let cancellation = after.cancellation.as_ref();
    let updated = conn.execute(
        "UPDATE bookings
         SET settler_id = ?3,
             status_code = ?4,
             version = ?5,
             service_start_code = ?6,
             base_price_cents = ?7,
             quote_description = ?8,
             quote_price_cents = ?9,
             total_cents = ?10,
             incompletion_status = ?11,
             cooldown_status = ?12,
             cooldown_started_at = ?13,
             reviewed_at = ?14,
             cancelled_by = ?15,
             cancelled_at = ?16,
             updated_at = ?17
         WHERE id = ?1 AND version = ?2;",
        params![
            after.id.to_string(),
            before.version,
            after.settler_id.as_ref().map(UserId::as_str),
            after.status.code_tenths(),
            after.version,
            after.service_start_code.as_deref(),
            after.pricing.base_price_cents,
            quote.map(|q| q.description.as_str()),
            quote.map(|q| q.price_cents),
            after.pricing.total_cents,
            after.incompletion_status.map(|kind| kind.as_str()),
            after.cooldown_status.map(|kind| kind.as_str()),
            after.cooldown_started_at,
            after.reviewed_at,
            cancellation.map(|c| c.cancelled_by.as_str()),
            cancellation.map(|c| c.cancelled_at),
            after.updated_at,
        ],
    )?;
    if updated == 0 {
        return Err(CoreError::StaleTransition {
            expected: format!("version {}", before.version),
            actual: "a newer version".to_string(),
        }
        .into());
    }

    if after.pricing.addons != before.pricing.addons {
        replace_addons(conn, after.id, SCOPE_PRICING, &after.pricing.addons)?;
    }
    if after.pending_quote != before.pending_quote {
        replace_quote_proposal(conn, after.id, after.pending_quote.as_ref())?;
    }

    for (position, acceptor) in after
        .acceptors
        .iter()
        .enumerate()
        .skip(before.acceptors.len())
    {
        conn.execute(
            "INSERT INTO booking_acceptors (booking_id, settler_id, position, display_name, accepted_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                after.id.to_string(),
                acceptor.settler_id.as_str(),
                position as i64,
                acceptor.display_name,
                acceptor.accepted_at,
            ],
        )?;
    }

    for kind in EvidenceKind::ALL {
        if after.evidence(kind) != before.evidence(kind) {
            replace_evidence(conn, after.id, kind, after.evidence(kind))?;
        }
    }

    if let (None, Some(cancellation)) = (&before.cancellation, &after.cancellation) {
        for (position, reason) in cancellation.reasons.iter().enumerate() {
            conn.execute(
                "INSERT INTO booking_cancel_reasons (booking_id, position, reason)
                 VALUES (?1, ?2, ?3);",
                params![after.id.to_string(), position as i64, reason],
            )?;
        }
    }

    for (seq, activity) in after.timeline.iter().enumerate().skip(before.timeline.len()) {
        insert_activity(conn, after.id, seq, activity)?;
    }

    Ok(())
}

fn replace_addons(conn: &Connection, id: BookingId, scope: &str, addons: &[Addon]) -> Result<()> {
    conn.execute(
        "DELETE FROM booking_addons WHERE booking_id = ?1 AND scope = ?2;",
        params![id.to_string(), scope],
    )?;
    for (position, addon) in addons.iter().enumerate() {
        conn.execute(
            "INSERT INTO booking_addons (booking_id, scope, position, name, price_cents)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                scope,
                position as i64,
                addon.name,
                addon.price_cents
            ],
        )?;
    }
    Ok(())
}

fn replace_quote_proposal(
    conn: &Connection,
    id: BookingId,
    proposal: Option<&QuoteProposal>,
) -> Result<()> {
    conn.execute(
        "DELETE FROM booking_quote_proposals WHERE booking_id = ?1;",
        [id.to_string()],
    )?;
    let Some(proposal) = proposal else {
        return replace_addons(conn, id, SCOPE_PROPOSAL, &[]);
    };
    let quote = proposal.manual_quote.as_ref();
    conn.execute(
        "INSERT INTO booking_quote_proposals (booking_id, quote_description, quote_price_cents,
                                              total_cents, previous_status, proposed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            id.to_string(),
            quote.map(|q| q.description.as_str()),
            quote.map(|q| q.price_cents),
            proposal.total_cents,
            proposal.previous_status.code_tenths(),
            proposal.proposed_at,
        ],
    )?;
    replace_addons(conn, id, SCOPE_PROPOSAL, &proposal.addons)
}

fn replace_evidence(
    conn: &Connection,
    id: BookingId,
    kind: EvidenceKind,
    evidence: Option<&Evidence>,
) -> Result<()> {
    conn.execute(
        "DELETE FROM booking_evidence WHERE booking_id = ?1 AND kind = ?2;",
        params![id.to_string(), kind.as_str()],
    )?;
    let Some(evidence) = evidence else {
        return Ok(());
    };
    conn.execute(
        "INSERT INTO booking_evidence (booking_id, kind, remark, updated_at)
         VALUES (?1, ?2, ?3, ?4);",
        params![id.to_string(), kind.as_str(), evidence.remark, evidence.updated_at],
    )?;
    for (position, url) in evidence.image_urls.iter().enumerate() {
        conn.execute(
            "INSERT INTO booking_evidence_images (booking_id, kind, position, url)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), kind.as_str(), position as i64, url],
        )?;
    }
    Ok(())
}

fn insert_activity(
    conn: &Connection,
    id: BookingId,
    seq: usize,
    activity: &BookingActivity,
) -> Result<()> {
    conn.execute(
        "INSERT INTO booking_activities (id, booking_id, seq, kind, actor, actor_id, status_code,
                                         note, request_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
        params![
            activity.id.to_string(),
            id.to_string(),
            seq as i64,
            activity.kind.as_str(),
            activity.actor.as_str(),
            activity.actor_id.as_ref().map(UserId::as_str),
            activity.status.code_tenths(),
            activity.note,
            activity.request_id,
            activity.created_at,
        ],
    )?;
    Ok(())
}

struct BookingRow {
    customer_id: String,
    settler_id: Option<String>,
    status_code: i32,
    version: i64,
    service_start_code: Option<String>,
    base_price_cents: i64,
    quote_description: Option<String>,
    quote_price_cents: Option<i64>,
    total_cents: i64,
    incompletion_status: Option<String>,
    cooldown_status: Option<String>,
    cooldown_started_at: Option<i64>,
    reviewed_at: Option<i64>,
    cancelled_by: Option<String>,
    cancelled_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

fn load_booking(conn: &Connection, id: BookingId) -> Result<Option<Booking>> {
    let row = conn
        .query_row(
            "SELECT customer_id, settler_id, status_code, version, service_start_code,
                    base_price_cents, quote_description, quote_price_cents, total_cents,
                    incompletion_status, cooldown_status, cooldown_started_at, reviewed_at,
                    cancelled_by, cancelled_at, created_at, updated_at
             FROM bookings WHERE id = ?1;",
            [id.to_string()],
            |row| {
                Ok(BookingRow {
                    customer_id: row.get(0)?,
                    settler_id: row.get(1)?,
                    status_code: row.get(2)?,
                    version: row.get(3)?,
                    service_start_code: row.get(4)?,
                    base_price_cents: row.get(5)?,
                    quote_description: row.get(6)?,
                    quote_price_cents: row.get(7)?,
                    total_cents: row.get(8)?,
                    incompletion_status: row.get(9)?,
                    cooldown_status: row.get(10)?,
                    cooldown_started_at: row.get(11)?,
                    reviewed_at: row.get(12)?,
                    cancelled_by: row.get(13)?,
                    cancelled_at: row.get(14)?,
                    created_at: row.get(15)?,
                    updated_at: row.get(16)?,
                })
            },
        )
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };

    let pricing = Pricing {
        base_price_cents: row.base_price_cents,
        addons: load_addons(conn, id, SCOPE_PRICING)?,
        manual_quote: manual_quote(row.quote_description, row.quote_price_cents),
        total_cents: row.total_cents,
    };
    let mut booking = Booking::new(id, parse_user_id(&row.customer_id)?, pricing, row.created_at);
    booking.settler_id = row.settler_id.as_deref().map(parse_user_id).transpose()?;
    booking.status = parse_status(row.status_code)?;
    booking.version = row.version;
    booking.service_start_code = row.service_start_code;
    booking.incompletion_status = row
        .incompletion_status
        .as_deref()
        .map(parse_activity_kind)
        .transpose()?;
    booking.cooldown_status = row
        .cooldown_status
        .as_deref()
        .map(parse_activity_kind)
        .transpose()?;
    booking.cooldown_started_at = row.cooldown_started_at;
    booking.reviewed_at = row.reviewed_at;
    booking.updated_at = row.updated_at;
    booking.acceptors = load_acceptors(conn, id)?;
    booking.pending_quote = load_quote_proposal(conn, id)?;

    let mut evidence = load_evidence(conn, id)?;
    for kind in EvidenceKind::ALL {
        if let Some(slot) = booking.evidence_mut(kind) {
            *slot = evidence.remove(&kind);
        }
    }
    if let Some(role) = row.cancelled_by.as_deref() {
        booking.cancellation = Some(Cancellation {
            cancelled_by: parse_role(role)?,
            reasons: load_cancel_reasons(conn, id)?,
            evidence: evidence
                .remove(&EvidenceKind::Cancellation)
                .unwrap_or_default(),
            cancelled_at: row.cancelled_at.unwrap_or(row.updated_at),
        });
    }
    booking.timeline = load_timeline(conn, id)?;
    Ok(Some(booking))
}

fn manual_quote(description: Option<String>, price_cents: Option<i64>) -> Option<ManualQuote> {
    match (description, price_cents) {
        (Some(description), Some(price_cents)) => Some(ManualQuote {
            description,
            price_cents,
        }),
        _ => None,
    }
}

fn load_addons(conn: &Connection, id: BookingId, scope: &str) -> Result<Vec<Addon>> {
    let mut stmt = conn.prepare(
        "SELECT name, price_cents FROM booking_addons
         WHERE booking_id = ?1 AND scope = ?2
         ORDER BY position ASC;",
    )?;
    let rows = stmt.query_map(params![id.to_string(), scope], |row| {
        Ok(Addon {
            name: row.get(0)?,
            price_cents: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

fn load_quote_proposal(conn: &Connection, id: BookingId) -> Result<Option<QuoteProposal>> {
    let row: Option<(Option<String>, Option<i64>, i64, i32, i64)> = conn
        .query_row(
            "SELECT quote_description, quote_price_cents, total_cents, previous_status, proposed_at
             FROM booking_quote_proposals WHERE booking_id = ?1;",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()?;
    let Some((description, price_cents, total_cents, previous_status, proposed_at)) = row else {
        return Ok(None);
    };
    Ok(Some(QuoteProposal {
        addons: load_addons(conn, id, SCOPE_PROPOSAL)?,
        manual_quote: manual_quote(description, price_cents),
        total_cents,
        previous_status: parse_status(previous_status)?,
        proposed_at,
    }))
}

fn load_acceptors(conn: &Connection, id: BookingId) -> Result<Vec<Acceptor>> {
    let mut stmt = conn.prepare(
        "SELECT settler_id, display_name, accepted_at FROM booking_acceptors
         WHERE booking_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut acceptors = Vec::new();
    while let Some(row) = rows.next()? {
        let settler_id: String = row.get(0)?;
        acceptors.push(Acceptor {
            settler_id: parse_user_id(&settler_id)?,
            display_name: row.get(1)?,
            accepted_at: row.get(2)?,
        });
    }
    Ok(acceptors)
}

fn load_evidence(conn: &Connection, id: BookingId) -> Result<HashMap<EvidenceKind, Evidence>> {
    let mut map = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT kind, remark, updated_at FROM booking_evidence WHERE booking_id = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    while let Some(row) = rows.next()? {
        let kind: String = row.get(0)?;
        map.insert(
            parse_evidence_kind(&kind)?,
            Evidence {
                image_urls: Vec::new(),
                remark: row.get(1)?,
                updated_at: row.get(2)?,
            },
        );
    }

    let mut stmt = conn.prepare(
        "SELECT kind, url FROM booking_evidence_images
         WHERE booking_id = ?1
         ORDER BY kind ASC, position ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    while let Some(row) = rows.next()? {
        let kind: String = row.get(0)?;
        let kind = parse_evidence_kind(&kind)?;
        if let Some(evidence) = map.get_mut(&kind) {
            evidence.image_urls.push(row.get(1)?);
        }
    }
    Ok(map)
}

fn load_cancel_reasons(conn: &Connection, id: BookingId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT reason FROM booking_cancel_reasons WHERE booking_id = ?1 ORDER BY position ASC;",
    )?;
    let rows = stmt.query_map([id.to_string()], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

fn load_timeline(conn: &Connection, id: BookingId) -> Result<Vec<BookingActivity>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, actor, actor_id, status_code, note, request_id, created_at
         FROM booking_activities
         WHERE booking_id = ?1
         ORDER BY seq ASC;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut timeline = Vec::new();
    while let Some(row) = rows.next()? {
        let activity_id: String = row.get(0)?;
        let kind: String = row.get(1)?;
        let actor: String = row.get(2)?;
        let actor_id: Option<String> = row.get(3)?;
        timeline.push(BookingActivity {
            id: ActivityId::from_str(&activity_id)
                .map_err(|_| StoreError::InvalidId(activity_id.clone()))?,
            kind: parse_activity_kind(&kind)?,
            actor: parse_role(&actor)?,
            actor_id: actor_id.as_deref().map(parse_user_id).transpose()?,
            status: parse_status(row.get(4)?)?,
            note: row.get(5)?,
            request_id: row.get(6)?,
            created_at: row.get(7)?,
        });
    }
    Ok(timeline)
}
