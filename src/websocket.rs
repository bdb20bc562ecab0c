/// WebSocket session actor: every connection owns its own preprocessing
/// session, so datasets and undo histories are never shared.
use actix::prelude::*;
use actix_web_actors::ws;
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::messages::{ClientMessage, ServerMessage};
use crate::session::Session;

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared by all connections: only the configuration new sessions
/// start from.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub config: SessionConfig,
}

impl AppState {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

/// WebSocket connection actor
pub struct SessionWebSocket {
    hb: Instant,
    session: Session,
}

impl SessionWebSocket {
    pub fn new(state: actix_web::web::Data<AppState>) -> Self {
        Self {
            hb: Instant::now(),
            session: Session::new(state.config.clone()),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                log::info!("websocket client heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    /// Produce the reply for one client message.
    fn handle_client_message(&mut self, msg: ClientMessage) -> ServerMessage {
        let session = &mut self.session;
        match msg {
            ClientMessage::Load { name, csv } => {
                let outcome = session.load_csv(&name, &csv).map(|_| ());
                table_or_error(session, outcome)
            }

            ClientMessage::Apply { action } => {
                let outcome = session.apply(&action).map(|_| ());
                table_or_error(session, outcome)
            }

            ClientMessage::Undo => {
                let outcome = session.undo().map(|_| ());
                table_or_error(session, outcome)
            }

            ClientMessage::Query { limit } => ServerMessage::table_data(session, limit),

            ClientMessage::Describe => match (session.describe(), session.profile()) {
                (Ok(summary), Ok(profile)) => ServerMessage::Description { summary, profile },
                (Err(e), _) | (_, Err(e)) => e.into(),
            },

            ClientMessage::CentralTendency { column } => match session.central_tendency(&column) {
                Ok(report) => ServerMessage::CentralTendency { column, report },
                Err(e) => e.into(),
            },

            ClientMessage::Quantiles { column } => match session.quantiles(&column) {
                Ok(report) => ServerMessage::Quantiles { column, report },
                Err(e) => e.into(),
            },

            ClientMessage::MissingUnique { column } => match session.missing_and_unique(&column) {
                Ok(report) => ServerMessage::MissingUnique { column, report },
                Err(e) => e.into(),
            },

            ClientMessage::Correlation { columns } => match session.correlation(&columns) {
                Ok(matrix) => ServerMessage::Correlation { matrix },
                Err(e) => e.into(),
            },

            ClientMessage::Export => match (session.export_file_name(), session.export_csv()) {
                (Ok(file_name), Ok(data)) => ServerMessage::Csv { file_name, data },
                (Err(e), _) | (_, Err(e)) => e.into(),
            },
        }
    }
}

/// Preview of the current table after a successful change, else the error.
fn table_or_error(session: &Session, outcome: crate::error::Result<()>) -> ServerMessage {
    match outcome {
        Ok(()) => ServerMessage::table_data(session, None),
        Err(e) => e.into(),
    }
}

impl Actor for SessionWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hb(ctx);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for SessionWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => self.handle_client_message(client_msg),
                    Err(e) => ServerMessage::invalid_format(&e),
                };
                if let ServerMessage::Error { message, .. } = &reply {
                    log::debug!("request failed: {}", message);
                }
                ctx.text(reply.to_json());
            }
            Ok(ws::Message::Binary(_)) => {
                log::warn!("unexpected binary message");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web;
    use serde_json::Value as JsonValue;

    fn send(socket: &mut SessionWebSocket, json: &str) -> JsonValue {
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        serde_json::from_str(&socket.handle_client_message(msg).to_json()).unwrap()
    }

    #[test]
    fn test_load_apply_undo_roundtrip() {
        let mut socket = SessionWebSocket::new(web::Data::new(AppState::default()));

        let reply = send(&mut socket, r#"{"type": "Load", "name": "d", "csv": "x\n1\n2\n3\n4\n100\n"}"#);
        assert_eq!(reply["type"], "TableData");
        assert_eq!(reply["total_rows"], 5);

        let reply = send(
            &mut socket,
            r#"{"type": "Apply", "action": {"op": "outlier", "method": "IQR", "columns": ["x"]}}"#,
        );
        assert_eq!(reply["total_rows"], 4);
        assert_eq!(reply["history_len"], 2);

        let reply = send(&mut socket, r#"{"type": "Undo"}"#);
        assert_eq!(reply["total_rows"], 5);

        let reply = send(&mut socket, r#"{"type": "Undo"}"#);
        assert_eq!(reply["type"], "Error");
        assert_eq!(reply["kind"], "state");
    }

    #[test]
    fn test_reports_and_export() {
        let mut socket = SessionWebSocket::new(web::Data::new(AppState::default()));
        send(&mut socket, r#"{"type": "Load", "name": "d", "csv": "x,y\n1,2\n2,4\n3,7\n"}"#);

        let reply = send(&mut socket, r#"{"type": "CentralTendency", "column": "x"}"#);
        assert_eq!(reply["report"]["mean"], 2.0);

        let reply = send(&mut socket, r#"{"type": "Describe"}"#);
        assert_eq!(reply["summary"].as_array().unwrap().len(), 2);

        let reply = send(&mut socket, r#"{"type": "Export"}"#);
        assert_eq!(reply["file_name"], "d_preprocessed.csv");
        assert_eq!(reply["data"], "x,y\n1,2\n2,4\n3,7\n");

        let reply = send(&mut socket, r#"{"type": "Quantiles", "column": "nope"}"#);
        assert_eq!(reply["kind"], "key");
    }
}
