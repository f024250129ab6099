use rusqlite::{params, types::Value, OptionalExtension};

use crate::db::connection::Database;
use crate::domain::note::Note;
use crate::errors::ServerError;

pub struct NewNote<'a> {
    pub parcel_no: Option<&'a str>,
    pub listing_id: Option<i64>,
    pub firm_id: i64,
    pub user_id: i64,
    pub note_text: &'a str,
}

pub fn insert_note(db: &Database, note_id: &str, note: &NewNote, now: i64) -> Result<Note, ServerError> {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO property_notes
                (note_id, parcel_no, listing_id, firm_id, user_id, note_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                note_id,
                note.parcel_no,
                note.listing_id,
                note.firm_id,
                note.user_id,
                note.note_text,
                now
            ],
        )
        .map_err(|e| ServerError::DbError(format!("insert note failed: {e}")))?;

        get_note_row(conn, note_id)?.ok_or(ServerError::InternalError)
    })
}

/// Notes for a firm, newest first, optionally narrowed to a parcel or a
/// listing. Each note carries its author's name.
pub fn get_notes_for_firm(
    db: &Database,
    firm_id: i64,
    parcel_no: Option<&str>,
    listing_id: Option<i64>,
) -> Result<Vec<Note>, ServerError> {
    let mut sql = String::from(
        r#"
        SELECT pn.note_id, pn.parcel_no, pn.listing_id, pn.firm_id, pn.user_id,
               pn.note_text, pn.created_at, u.first_name, u.last_name
          FROM property_notes pn
          JOIN users u ON pn.user_id = u.user_id
         WHERE pn.firm_id = ?
        "#,
    );
    let mut sql_params: Vec<Value> = vec![Value::from(firm_id)];

    if let Some(p) = parcel_no {
        sql.push_str(" AND pn.parcel_no = ?");
        sql_params.push(Value::from(p.to_string()));
    }
    if let Some(l) = listing_id {
        sql.push_str(" AND pn.listing_id = ?");
        sql_params.push(Value::from(l));
    }

    sql.push_str(" ORDER BY pn.created_at DESC");

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(sql_params.iter()), map_note)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

/// Returns false when the note did not exist.
pub fn delete_note(db: &Database, note_id: &str) -> Result<bool, ServerError> {
    db.with_conn(|conn| {
        let deleted = conn
            .execute("DELETE FROM property_notes WHERE note_id = ?", params![note_id])
            .map_err(|e| ServerError::DbError(format!("delete note failed: {e}")))?;
        Ok(deleted > 0)
    })
}

fn get_note_row(conn: &rusqlite::Connection, note_id: &str) -> Result<Option<Note>, ServerError> {
    conn.query_row(
        r#"
        SELECT pn.note_id, pn.parcel_no, pn.listing_id, pn.firm_id, pn.user_id,
               pn.note_text, pn.created_at, u.first_name, u.last_name
          FROM property_notes pn
          JOIN users u ON pn.user_id = u.user_id
         WHERE pn.note_id = ?
        "#,
        params![note_id],
        map_note,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select note failed: {e}")))
}

fn map_note(row: &rusqlite::Row) -> rusqlite::Result<Note> {
    Ok(Note {
        note_id: row.get(0)?,
        parcel_no: row.get(1)?,
        listing_id: row.get(2)?,
        firm_id: row.get(3)?,
        user_id: row.get(4)?,
        note_text: row.get(5)?,
        created_at: row.get(6)?,
        first_name: row.get(7)?,
        last_name: row.get(8)?,
    })
}
