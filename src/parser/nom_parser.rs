use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{
        alpha1, alphanumeric1, char, multispace0, newline, none_of, one_of, space0,
    },
    combinator::{opt, recognize, value},
    multi::{many0, many1},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::TreeSettings;

/// A parameter value as written in the source.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParamSource<'src> {
    /// Literal value could have been decoded, so it is an owned string.
    Literal(String),
    /// Knowledge path, read at run time.
    Path(&'src str),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParamDef<'src> {
    pub name: &'src str,
    pub value: ParamSource<'src>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TreeDef<'src> {
    pub ty: &'src str,
    pub params: Vec<ParamDef<'src>>,
    pub children: Vec<TreeDef<'src>>,
}

impl<'src> TreeDef<'src> {
    pub fn new(ty: &'src str) -> Self {
        Self {
            ty,
            params: vec![],
            children: vec![],
        }
    }

    pub fn with_params(mut self, params: Vec<ParamDef<'src>>) -> Self {
        self.params = params;
        self
    }

    pub fn with_children(mut self, children: Vec<TreeDef<'src>>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TreeRootDef<'src> {
    pub name: &'src str,
    pub settings: TreeSettings,
    pub root: TreeDef<'src>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct TreeSource<'src> {
    pub tree_defs: Vec<TreeRootDef<'src>>,
}

impl<'src> TreeSource<'src> {
    pub fn find(&self, name: &str) -> Option<&TreeRootDef<'src>> {
        self.tree_defs.iter().find(|tree| tree.name == name)
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Knowledge paths may be nested with `/` or `.`.
fn path(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_"), tag("/"), tag(".")))),
    ))(input)
}

fn newlines(i: &str) -> IResult<&str, ()> {
    delimited(space0, many1(one_of("\r\n")), space0)(i).map(|(rest, _)| (rest, ()))
}

fn open_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('('), space0))(i)
}

fn close_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(multispace0, char(')'), space0))(i)
}

fn open_brace(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('{'), space0))(i)
}

fn close_brace(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char('}'), space0))(i)
}

fn str_literal(input: &str) -> IResult<&str, String> {
    let (r, val) = delimited(
        preceded(multispace0, char('\"')),
        many0(none_of("\"")),
        terminated(char('"'), space0),
    )(input)?;
    Ok((
        r,
        val.iter()
            .collect::<String>()
            .replace("\\\\", "\\")
            .replace("\\n", "\n"),
    ))
}

fn number(i: &str) -> IResult<&str, String> {
    recognize_float(i).map(|(i, s)| (i, s.to_owned()))
}

fn bare_word(i: &str) -> IResult<&str, String> {
    identifier(i).map(|(i, s)| (i, s.to_owned()))
}

fn literal(i: &str) -> IResult<&str, String> {
    alt((str_literal, number, bare_word))(i)
}

fn path_value(i: &str) -> IResult<&str, ParamSource> {
    let (i, _) = delimited(space0, tag("<-"), space0)(i)?;
    let (i, path) = path(i)?;
    Ok((i, ParamSource::Path(path)))
}

fn literal_value(i: &str) -> IResult<&str, ParamSource> {
    let (i, _) = delimited(space0, char('='), space0)(i)?;
    let (i, literal) = literal(i)?;
    Ok((i, ParamSource::Literal(literal)))
}

fn param(i: &str) -> IResult<&str, ParamDef> {
    let (i, name) = delimited(space0, identifier, space0)(i)?;

    let (i, value) = alt((path_value, literal_value))(i)?;

    Ok((i, ParamDef { name, value }))
}

fn params(i: &str) -> IResult<&str, Vec<ParamDef>> {
    many0(delimited(
        multispace0,
        param,
        many0(pair(multispace0, char(','))),
    ))(i)
}

fn line_comment<T>(i: &str) -> IResult<&str, Option<T>> {
    let (i, _) = tuple((space0, char('#'), opt(is_not("\n\r"))))(i)?;

    Ok((i, None))
}

fn some<I, R>(f: impl Fn(I) -> IResult<I, R>) -> impl Fn(I) -> IResult<I, Option<R>> {
    move |i| {
        let (i, res) = f(i)?;
        Ok((i, Some(res)))
    }
}

fn tree_children(i: &str) -> IResult<&str, Vec<TreeDef>> {
    let (i, _) = many0(newlines)(i)?;

    let (i, v) = many0(delimited(
        space0,
        alt((line_comment, some(parse_tree_node))),
        many0(newlines),
    ))(i)?;

    let (i, _) = many0(newlines)(i)?;

    Ok((i, v.into_iter().flatten().collect()))
}

fn parse_tree_node(i: &str) -> IResult<&str, TreeDef> {
    let (i, ty) = delimited(space0, identifier, space0)(i)?;

    let (i, params) = opt(delimited(open_paren, params, close_paren))(i)?;

    let (i, children) = opt(delimited(open_brace, tree_children, close_brace))(i)?;

    let (i, _) = opt(line_comment::<()>)(i)?;

    Ok((
        i,
        TreeDef {
            ty,
            params: params.unwrap_or_default(),
            children: children.unwrap_or_default(),
        },
    ))
}

/// Tree attributes use the literal parameter syntax and map onto
/// [`TreeSettings`]. Anything else is a hard parse failure.
fn tree_settings(i: &str) -> IResult<&str, TreeSettings> {
    let (rest, attrs) = delimited(open_paren, params, close_paren)(i)?;
    let mut settings = TreeSettings::default();
    for attr in attrs {
        let failure =
            || nom::Err::Failure(nom::error::Error::new(i, nom::error::ErrorKind::Verify));
        let ParamSource::Literal(value) = attr.value else {
            return Err(failure());
        };
        match attr.name {
            "knowledge_schema" => settings.knowledge_schema = Some(value),
            "update_fps" => settings.update_fps = value.parse().map_err(|_| failure())?,
            _ => return Err(failure()),
        }
    }
    Ok((rest, settings))
}

fn parse_tree(i: &str) -> IResult<&str, TreeRootDef> {
    let (i, _) = delimited(multispace0, tag("tree"), space0)(i)?;

    let (i, name) = delimited(space0, identifier, space0)(i)?;

    let (i, settings) = opt(tree_settings)(i)?;

    let (i, _) = delimited(space0, tag("="), space0)(i)?;

    let (i, root) = parse_tree_node(i)?;

    Ok((
        i,
        TreeRootDef {
            name,
            settings: settings.unwrap_or_default(),
            root,
        },
    ))
}

/// Parses a whole source file into trees.
pub fn parse_file(i: &str) -> IResult<&str, TreeSource> {
    let (i, stmts) = many0(alt((
        delimited(multispace0, line_comment, newline),
        some(parse_tree),
    )))(i)?;

    // Eat up trailing newlines to indicate that the input was thoroughly consumed
    let (i, _) = multispace0(i)?;

    Ok((
        i,
        TreeSource {
            tree_defs: stmts.into_iter().flatten().collect(),
        },
    ))
}

#[cfg(test)]
mod test;
