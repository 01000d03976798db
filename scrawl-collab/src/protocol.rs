//! The textual wire grammar shared by server and clients.
//!
//! One command per line, UTF-8, fields separated by single spaces:
//!
//! ```text
//! ADD <Kind> <fields...> <color>
//! ADD_ID <id> <Kind> <fields...> <color>
//! MOVE <id> <dx> <dy>
//! RECOLOR <id> <color>
//! DELETE <id>
//! ```
//!
//! Ellipse, Rectangle and Segment carry `x1 y1 x2 y2`; Polyline carries a
//! flattened, unbounded `x0 y0 x1 y1 ...` point list. The color is always
//! the final token, so Polyline decoding anchors on the end of the line
//! rather than a fixed offset.
//!
//! `ADD` deliberately carries no identifier: the server assigns one on
//! acceptance, and because every mirror replays broadcasts in the
//! server's acceptance order, each mirror's own counter derives the same
//! identifier. `ADD_ID` pins the identifier explicitly and is only used
//! for the state dump a freshly connected client receives.

use scrawl_core::{Color, Point, Shape, Sketch};

/// A single replicated edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a shape; the receiver allocates the identifier.
    Add(Shape),
    /// Insert a shape under an explicit identifier (initial sync).
    AddWithId(u32, Shape),
    /// Translate a shape by a relative delta.
    Move { id: u32, dx: i32, dy: i32 },
    /// Replace a shape's color.
    Recolor { id: u32, color: Color },
    /// Remove a shape.
    Delete { id: u32 },
}

/// A line that does not decode to a [`Command`].
///
/// Malformed lines are logged and dropped by both sides; they are never
/// fatal to a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty line")]
    EmptyLine,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("unknown shape kind `{0}`")]
    UnknownShape(String),
    #[error("too few fields for `{0}`")]
    MissingFields(&'static str),
    #[error("bad integer field `{0}`")]
    BadInteger(String),
    #[error("polyline needs an even, nonzero number of coordinates")]
    BadPointList,
}

impl Command {
    /// Encode to one protocol line, without the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            Command::Add(shape) => format!("ADD {}", encode_shape(shape)),
            Command::AddWithId(id, shape) => format!("ADD_ID {id} {}", encode_shape(shape)),
            Command::Move { id, dx, dy } => format!("MOVE {id} {dx} {dy}"),
            Command::Recolor { id, color } => format!("RECOLOR {id} {}", color.packed()),
            Command::Delete { id } => format!("DELETE {id}"),
        }
    }

    /// Decode one protocol line.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (&keyword, rest) = fields.split_first().ok_or(ProtocolError::EmptyLine)?;

        match keyword {
            "ADD" => {
                let (&kind, fields) = rest
                    .split_first()
                    .ok_or(ProtocolError::MissingFields("ADD"))?;
                Ok(Command::Add(parse_shape(kind, fields)?))
            }
            "ADD_ID" => match rest {
                [id, kind, fields @ ..] => Ok(Command::AddWithId(
                    parse_id(id)?,
                    parse_shape(kind, fields)?,
                )),
                _ => Err(ProtocolError::MissingFields("ADD_ID")),
            },
            "MOVE" => match rest {
                [id, dx, dy, ..] => Ok(Command::Move {
                    id: parse_id(id)?,
                    dx: parse_int(dx)?,
                    dy: parse_int(dy)?,
                }),
                _ => Err(ProtocolError::MissingFields("MOVE")),
            },
            "RECOLOR" => match rest {
                [id, color, ..] => Ok(Command::Recolor {
                    id: parse_id(id)?,
                    color: parse_color(color)?,
                }),
                _ => Err(ProtocolError::MissingFields("RECOLOR")),
            },
            "DELETE" => match rest {
                [id, ..] => Ok(Command::Delete { id: parse_id(id)? }),
                _ => Err(ProtocolError::MissingFields("DELETE")),
            },
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    /// Apply this command to a sketch.
    ///
    /// This is the one replay routine both sides share: the server runs
    /// it on the authoritative sketch before broadcasting, every client
    /// runs it on its mirror when the broadcast arrives. `Add` allocates
    /// from the sketch's own counter; stale `Move`/`Recolor`/`Delete`
    /// targets are silently skipped.
    pub fn apply(self, sketch: &mut Sketch) {
        match self {
            Command::Add(shape) => {
                sketch.add(shape);
            }
            Command::AddWithId(id, shape) => sketch.add_with_id(id, shape),
            Command::Move { id, dx, dy } => {
                sketch.translate(id, dx, dy);
            }
            Command::Recolor { id, color } => {
                sketch.recolor(id, color);
            }
            Command::Delete { id } => {
                sketch.remove(id);
            }
        }
    }
}

fn encode_shape(shape: &Shape) -> String {
    match shape {
        Shape::Ellipse { x1, y1, x2, y2, color }
        | Shape::Rectangle { x1, y1, x2, y2, color }
        | Shape::Segment { x1, y1, x2, y2, color } => {
            format!("{} {x1} {y1} {x2} {y2} {}", shape.kind(), color.packed())
        }
        Shape::Polyline { points, color } => {
            let mut out = String::from("Polyline");
            for p in points {
                out.push_str(&format!(" {} {}", p.x, p.y));
            }
            out.push_str(&format!(" {}", color.packed()));
            out
        }
    }
}

/// Decode the shape fields following a kind keyword. `fields` holds the
/// coordinates plus the trailing color token.
fn parse_shape(kind: &str, fields: &[&str]) -> Result<Shape, ProtocolError> {
    match kind {
        "Ellipse" | "Rectangle" | "Segment" => {
            if fields.len() < 5 {
                return Err(ProtocolError::MissingFields("ADD"));
            }
            let x1 = parse_int(fields[0])?;
            let y1 = parse_int(fields[1])?;
            let x2 = parse_int(fields[2])?;
            let y2 = parse_int(fields[3])?;
            let color = parse_color(fields[4])?;
            Ok(match kind {
                "Ellipse" => Shape::ellipse(x1, y1, x2, y2, color),
                "Rectangle" => Shape::rectangle(x1, y1, x2, y2, color),
                _ => Shape::segment(x1, y1, x2, y2, color),
            })
        }
        "Polyline" => {
            // Color is the final token; everything before it is the
            // flattened point list, whose length is unbounded.
            let (&color, coords) = fields.split_last().ok_or(ProtocolError::BadPointList)?;
            if coords.is_empty() || coords.len() % 2 != 0 {
                return Err(ProtocolError::BadPointList);
            }
            let color = parse_color(color)?;
            let points = coords
                .chunks(2)
                .map(|pair| Ok(Point::new(parse_int(pair[0])?, parse_int(pair[1])?)))
                .collect::<Result<Vec<_>, ProtocolError>>()?;
            Ok(Shape::polyline(points, color))
        }
        other => Err(ProtocolError::UnknownShape(other.to_string())),
    }
}

fn parse_int(token: &str) -> Result<i32, ProtocolError> {
    token
        .parse()
        .map_err(|_| ProtocolError::BadInteger(token.to_string()))
}

fn parse_id(token: &str) -> Result<u32, ProtocolError> {
    token
        .parse()
        .map_err(|_| ProtocolError::BadInteger(token.to_string()))
}

/// Colors arrive as one packed decimal integer. Peers using AWT transmit
/// `Color.getRGB()`, whose opaque alpha byte makes the value negative;
/// both the signed and the alpha-free spelling decode to the same color.
fn parse_color(token: &str) -> Result<Color, ProtocolError> {
    let packed: i64 = token
        .parse()
        .map_err(|_| ProtocolError::BadInteger(token.to_string()))?;
    if packed < i32::MIN as i64 || packed > u32::MAX as i64 {
        return Err(ProtocolError::BadInteger(token.to_string()));
    }
    Ok(Color::from_packed(packed as i32))
}
