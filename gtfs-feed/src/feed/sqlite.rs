use super::{EntityCollection, Storage};
use crate::objects::Entity;
use crate::Error;
use rusqlite::{params, Connection, OptionalExtension};
use std::marker::PhantomData;
use std::path::Path;
use std::rc::Rc;

/// Keeps every collection in a table of a SQLite database
///
/// Each table holds the CSV line of the records, next to their key and foreign key.
/// The `row_id` keeps the insertion order.
pub struct SqliteStorage {
    conn: Rc<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Ok(SqliteStorage {
            conn: Rc::new(Connection::open(path)?),
        })
    }

    /// A database that only lives as long as the storage
    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(SqliteStorage {
            conn: Rc::new(Connection::open_in_memory()?),
        })
    }
}

impl Storage for SqliteStorage {
    type Collection<T: Entity> = SqliteCollection<T>;

    fn collection<T: Entity>(&self) -> Result<Self::Collection<T>, Error> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    row_id INTEGER PRIMARY KEY,
                    key TEXT,
                    foreign_key TEXT,
                    record TEXT NOT NULL
                )",
                T::TABLE
            ),
            [],
        )?;
        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_key ON {0} (key)",
                T::TABLE
            ),
            [],
        )?;
        self.conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_foreign_key ON {0} (foreign_key)",
                T::TABLE
            ),
            [],
        )?;
        Ok(SqliteCollection {
            conn: Rc::clone(&self.conn),
            _entity: PhantomData,
        })
    }
}

/// The table of one GTFS file
pub struct SqliteCollection<T> {
    conn: Rc<Connection>,
    _entity: PhantomData<T>,
}

fn encode<T: Entity>(entity: &T) -> Result<String, Error> {
    let encoding_error = |reason: String| Error::RecordEncoding {
        table: T::TABLE,
        reason,
    };
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.serialize(entity)
        .map_err(|e| encoding_error(e.to_string()))?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| encoding_error(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| encoding_error(e.to_string()))
}

// Without headers, the fields are read back in declaration order
fn decode<T: Entity>(record: &str) -> Result<T, Error> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(record.as_bytes())
        .deserialize()
        .next()
        .unwrap_or_else(|| {
            Err(csv::Error::from(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "empty record",
            )))
        })
        .map_err(|e| Error::RecordEncoding {
            table: T::TABLE,
            reason: e.to_string(),
        })
}

impl<T: Entity> SqliteCollection<T> {
    fn select(&self, condition: &str, value: Option<&str>) -> Result<Vec<T>, Error> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT record FROM {} {} ORDER BY row_id",
            T::TABLE,
            condition
        ))?;
        let records = match value {
            Some(value) => stmt
                .query_map(params![value], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?,
        };
        records.iter().map(|r| decode(r)).collect()
    }

    fn insert(conn: &Connection, entity: &T) -> Result<(), Error> {
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO {} (key, foreign_key, record) VALUES (?1, ?2, ?3)",
            T::TABLE
        ))?;
        stmt.execute(params![entity.key(), entity.foreign_key(), encode(entity)?])?;
        Ok(())
    }
}

impl<T: Entity> EntityCollection<T> for SqliteCollection<T> {
    fn add(&mut self, entity: T) -> Result<(), Error> {
        Self::insert(&self.conn, &entity)
    }

    fn add_all<I>(&mut self, entities: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        for entity in entities {
            Self::insert(&tx, &entity)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<T>, Error> {
        self.select("", None)
    }

    fn get(&self, key: &str) -> Result<Option<T>, Error> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT record FROM {} WHERE key = ?1 ORDER BY row_id LIMIT 1",
            T::TABLE
        ))?;
        let record: Option<String> = stmt
            .query_row(params![key], |row| row.get(0))
            .optional()?;
        record.map(|r| decode(&r)).transpose()
    }

    fn get_by_foreign_key(&self, foreign_key: &str) -> Result<Vec<T>, Error> {
        self.select("WHERE foreign_key = ?1", Some(foreign_key))
    }

    fn remove(&mut self, key: &str) -> Result<usize, Error> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE key = ?1", T::TABLE),
            params![key],
        )?;
        Ok(removed)
    }

    fn remove_by_foreign_key(&mut self, foreign_key: &str) -> Result<usize, Error> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE foreign_key = ?1", T::TABLE),
            params![foreign_key],
        )?;
        Ok(removed)
    }

    fn len(&self) -> Result<usize, Error> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", T::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
