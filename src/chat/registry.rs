use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chat::event::ServerEvent;

pub type ConnId = Uuid;

/// A connected member: the name it goes by plus the handle frames get pushed
/// through.
#[derive(Debug, Clone)]
pub struct Member {
    pub user: String,
    pub tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Live membership, keyed by classroom code. Starts empty on every boot;
/// nothing in the store feeds it. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct Rooms {
    inner: Mutex<HashMap<String, HashMap<ConnId, Member>>>,
}

impl Rooms {
    pub fn join(&self, code: &str, conn: ConnId, member: Member) {
        let mut rooms = self.inner.lock().unwrap();
        rooms.entry(code.to_owned()).or_default().insert(conn, member);
    }

    /// Drops the membership, pruning the room when it empties. Returns the
    /// member's name when the connection was actually in the room.
    pub fn leave(&self, code: &str, conn: ConnId) -> Option<String> {
        let mut rooms = self.inner.lock().unwrap();
        let members = rooms.get_mut(code)?;
        let member = members.remove(&conn);
        let emptied = members.is_empty();
        if emptied {
            rooms.remove(code);
        }
        member.map(|member| member.user)
    }

    /// The name the connection goes by in the room.
    pub fn user(&self, code: &str, conn: ConnId) -> Option<String> {
        let rooms = self.inner.lock().unwrap();
        Some(rooms.get(code)?.get(&conn)?.user.clone())
    }

    pub fn member_count(&self, code: &str) -> usize {
        let rooms = self.inner.lock().unwrap();
        rooms.get(code).map_or(0, HashMap::len)
    }

    pub fn broadcast(&self, code: &str, event: &ServerEvent) -> usize {
        self.send_filtered(code, event, None)
    }

    pub fn broadcast_except(&self, code: &str, except: ConnId, event: &ServerEvent) -> usize {
        self.send_filtered(code, event, Some(except))
    }

    /// Fans the event out, skipping `except` when given. A member whose
    /// channel is gone gets pruned on the spot. Returns how many sends landed.
    fn send_filtered(&self, code: &str, event: &ServerEvent, except: Option<ConnId>) -> usize {
        let mut rooms = self.inner.lock().unwrap();
        let Some(members) = rooms.get_mut(code) else {
            return 0;
        };

        let mut delivered = 0;
        members.retain(|conn, member| {
            if except == Some(*conn) {
                return true;
            }
            match member.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });

        let emptied = members.is_empty();
        if emptied {
            rooms.remove(code);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(user: &str) -> (Member, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Member {
                user: user.to_owned(),
                tx,
            },
            rx,
        )
    }

    #[test]
    fn broadcast_reaches_every_member() {
        let rooms = Rooms::default();
        let (bea, mut bea_rx) = member("Bea");
        let (omar, mut omar_rx) = member("Omar");
        rooms.join("MATH1", Uuid::now_v7(), bea);
        rooms.join("MATH1", Uuid::now_v7(), omar);

        let delivered = rooms.broadcast("MATH1", &ServerEvent::System("hi".to_owned()));
        assert_eq!(delivered, 2);
        assert!(bea_rx.try_recv().is_ok());
        assert!(omar_rx.try_recv().is_ok());
    }

    #[test]
    fn broadcast_except_skips_that_connection() {
        let rooms = Rooms::default();
        let bea_conn = Uuid::now_v7();
        let (bea, mut bea_rx) = member("Bea");
        let (omar, mut omar_rx) = member("Omar");
        rooms.join("MATH1", bea_conn, bea);
        rooms.join("MATH1", Uuid::now_v7(), omar);

        let delivered =
            rooms.broadcast_except("MATH1", bea_conn, &ServerEvent::System("hi".to_owned()));
        assert_eq!(delivered, 1);
        assert!(bea_rx.try_recv().is_err());
        assert!(omar_rx.try_recv().is_ok());
    }

    #[test]
    fn dead_members_get_pruned_on_send() {
        let rooms = Rooms::default();
        let (bea, bea_rx) = member("Bea");
        let (omar, mut omar_rx) = member("Omar");
        rooms.join("MATH1", Uuid::now_v7(), bea);
        rooms.join("MATH1", Uuid::now_v7(), omar);

        drop(bea_rx);
        let delivered = rooms.broadcast("MATH1", &ServerEvent::System("hi".to_owned()));
        assert_eq!(delivered, 1);
        assert_eq!(rooms.member_count("MATH1"), 1);
        assert!(omar_rx.try_recv().is_ok());
    }

    #[test]
    fn leave_reports_the_name_once() {
        let rooms = Rooms::default();
        let conn = Uuid::now_v7();
        let (bea, _bea_rx) = member("Bea");
        rooms.join("MATH1", conn, bea);

        assert_eq!(rooms.leave("MATH1", conn), Some("Bea".to_owned()));
        assert_eq!(rooms.leave("MATH1", conn), None);
        assert_eq!(rooms.member_count("MATH1"), 0);
    }

    #[test]
    fn rejoining_replaces_the_member_entry() {
        let rooms = Rooms::default();
        let conn = Uuid::now_v7();
        let (first, _first_rx) = member("Bea");
        let (second, mut second_rx) = member("Beatrix");
        rooms.join("MATH1", conn, first);
        rooms.join("MATH1", conn, second);

        assert_eq!(rooms.member_count("MATH1"), 1);
        assert_eq!(rooms.user("MATH1", conn).as_deref(), Some("Beatrix"));

        rooms.broadcast("MATH1", &ServerEvent::System("hi".to_owned()));
        assert!(second_rx.try_recv().is_ok());
    }

    #[test]
    fn empty_rooms_disappear_from_the_map() {
        let rooms = Rooms::default();
        let conn = Uuid::now_v7();
        let (bea, bea_rx) = member("Bea");
        rooms.join("MATH1", conn, bea);

        drop(bea_rx);
        rooms.broadcast("MATH1", &ServerEvent::System("hi".to_owned()));
        assert_eq!(rooms.member_count("MATH1"), 0);
        assert!(rooms.inner.lock().unwrap().is_empty());
    }
}
