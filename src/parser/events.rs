// Event command parsers: education(...), race(...), metric(...), prep(...)

use super::ast::{EventCommand, ValueList};
use super::lexer::{identifier, string_literal, ws};
use crate::data::{Metric, TestPrep};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, map_res, opt},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};

/// `*` or a comma separated list of items (possibly empty)
fn value_list<'a, T, F>(item: F) -> impl FnMut(&'a str) -> IResult<&'a str, ValueList<T>>
where
    F: FnMut(&'a str) -> IResult<&'a str, T>,
{
    alt((
        map(ws(char('*')), |_| ValueList::All),
        map(separated_list0(ws(char(',')), ws(item)), ValueList::Listed),
    ))
}

/// Format: education("some college", "high school") or education(*)
pub fn parse_education(input: &str) -> IResult<&str, EventCommand> {
    let (input, _) = ws(tag("education"))(input)?;
    let (input, values) = delimited(
        ws(char('(')),
        value_list(string_literal),
        ws(char(')')),
    )(input)?;
    Ok((input, EventCommand::Education(values)))
}

/// Format: race("group B") or race(*)
pub fn parse_race(input: &str) -> IResult<&str, EventCommand> {
    let (input, _) = ws(tag("race"))(input)?;
    let (input, values) = delimited(
        ws(char('(')),
        value_list(string_literal),
        ws(char(')')),
    )(input)?;
    Ok((input, EventCommand::Race(values)))
}

/// Format: metric(reading) or metric() to clear the dropdown
pub fn parse_metric(input: &str) -> IResult<&str, EventCommand> {
    let (input, _) = ws(tag("metric"))(input)?;
    let (input, metric) = delimited(
        ws(char('(')),
        opt(ws(map_res(identifier, |s| s.parse::<Metric>()))),
        ws(char(')')),
    )(input)?;
    Ok((input, EventCommand::Metric(metric)))
}

/// Format: prep(completed, none), prep(*) or prep()
pub fn parse_prep(input: &str) -> IResult<&str, EventCommand> {
    let (input, _) = ws(tag("prep"))(input)?;
    let (input, values) = delimited(
        ws(char('(')),
        value_list(map_res(identifier, |s| s.parse::<TestPrep>())),
        ws(char(')')),
    )(input)?;
    Ok((input, EventCommand::Prep(values)))
}

pub fn parse_event(input: &str) -> IResult<&str, EventCommand> {
    alt((parse_education, parse_race, parse_metric, parse_prep))(input)
}
