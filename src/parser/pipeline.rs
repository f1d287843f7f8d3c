// Pipeline parser for selection event scripts

use super::ast::EventScript;
use super::events::parse_event;
use super::lexer::ws;
use nom::{
    bytes::complete::tag,
    combinator::{eof, opt},
    multi::separated_list1,
    IResult,
};

/// Parse a complete event script
/// Format: event | event | ...
pub fn parse_event_script(input: &str) -> IResult<&str, EventScript> {
    // A leading "|" is tolerated so scripts can be built by concatenation
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, events) = separated_list1(ws(tag("|")), parse_event)(input)?;

    let (input, _) = ws(eof)(input)?;

    Ok((input, EventScript { events }))
}
