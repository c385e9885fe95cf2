//! Parser for the CQL subset the memory cluster understands
//!
//! Covers the statements the exporter writes and the queries it runs:
//! keyspace, type, table and index DDL, `DROP ... IF EXISTS`, `INSERT`,
//! counter `UPDATE`, and `SELECT *` with equality filters and `LIMIT`.

use std::collections::BTreeMap;

use cqldump_core::{
    ClusteringOrder, ColumnMetadata, ColumnType, IndexKind, IndexMetadata, TableMetadata,
};

pub(crate) type ParseResult<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `"quoted identifier"`, case preserved
    Ident(String),
    /// Bare word: keyword, unquoted name, number, uuid, blob
    Word(String),
    /// `'string literal'`
    Str(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    start: usize,
    end: usize,
}

fn is_word_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_word_char(c: char) -> bool {
    is_word_start(c) || c == '.'
}

fn tokenize(src: &str) -> ParseResult<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' || c == '\'' {
            chars.next();
            let mut text = String::new();
            let mut end = None;
            while let Some((i, ch)) = chars.next() {
                if ch == c {
                    if matches!(chars.peek(), Some(&(_, next)) if next == c) {
                        text.push(c);
                        chars.next();
                        continue;
                    }
                    end = Some(i + 1);
                    break;
                }
                text.push(ch);
            }
            let end = end.ok_or_else(|| format!("unterminated quote at offset {}", start))?;
            let token = if c == '"' {
                Token::Ident(text)
            } else {
                Token::Str(text)
            };
            tokens.push(Spanned { token, start, end });
            continue;
        }
        if is_word_start(c) {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if !is_word_char(ch) {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
            tokens.push(Spanned {
                token: Token::Word(src[start..end].to_string()),
                start,
                end,
            });
            continue;
        }
        if "(),;=+[]{}:<>*.".contains(c) {
            chars.next();
            tokens.push(Spanned {
                token: Token::Punct(c),
                start,
                end: start + 1,
            });
            continue;
        }
        return Err(format!("unexpected character '{}' at offset {}", c, start));
    }
    Ok(tokens)
}

/// Untyped literal; typed against the column when applied
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Null,
    Str(String),
    Word(String),
    /// Quoted identifier, only valid as a UDT field name
    Ident(String),
    List(Vec<Literal>),
    /// `{...}`: set (no values), map or UDT (values)
    Braces(Vec<(Literal, Option<Literal>)>),
    Tuple(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Assignment {
    Set(String, Literal),
    Increment(String, Literal),
}

#[derive(Debug, Clone)]
pub(crate) enum Statement {
    CreateKeyspace {
        name: String,
        if_not_exists: bool,
        replication: BTreeMap<String, String>,
        durable_writes: bool,
    },
    DropKeyspace {
        name: String,
        if_exists: bool,
    },
    CreateType {
        keyspace: String,
        name: String,
        fields: Vec<(String, ColumnType)>,
    },
    CreateTable {
        if_not_exists: bool,
        table: TableMetadata,
    },
    CreateIndex {
        keyspace: String,
        table: String,
        index: IndexMetadata,
    },
    DropTable {
        keyspace: String,
        table: String,
        if_exists: bool,
    },
    Insert {
        keyspace: String,
        table: String,
        columns: Vec<String>,
        values: Vec<Literal>,
    },
    Update {
        keyspace: String,
        table: String,
        assignments: Vec<Assignment>,
        filter: Vec<(String, Literal)>,
    },
    Select {
        keyspace: String,
        table: String,
        filter: Vec<(String, Literal)>,
        limit: Option<usize>,
    },
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> ParseResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .map(|s| s.token.clone())
            .ok_or_else(|| "unexpected end of statement".to_string())?;
        self.pos += 1;
        Ok(token)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(format!("expected {} near {:?}", keyword, self.peek()))
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn punct(&mut self, c: char) -> ParseResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(format!("expected '{}' near {:?}", c, self.peek()))
        }
    }

    fn if_exists(&mut self) -> ParseResult<bool> {
        if self.eat_keyword("IF") {
            self.keyword("EXISTS")?;
            return Ok(true);
        }
        Ok(false)
    }

    fn if_not_exists(&mut self) -> ParseResult<bool> {
        if self.eat_keyword("IF") {
            self.keyword("NOT")?;
            self.keyword("EXISTS")?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Quoted names keep their case; bare names are folded to lowercase
    fn name(&mut self) -> ParseResult<String> {
        match self.next()? {
            Token::Ident(name) => Ok(name),
            Token::Word(word) if !word.contains('.') => Ok(word.to_lowercase()),
            other => Err(format!("expected a name, found {:?}", other)),
        }
    }

    fn qualified_name(&mut self) -> ParseResult<(String, String)> {
        if let Some(Token::Word(word)) = self.peek() {
            if let Some((ks, table)) = word.split_once('.') {
                let names = (ks.to_lowercase(), table.to_lowercase());
                self.pos += 1;
                return Ok(names);
            }
        }
        let first = self.name()?;
        if !self.eat_punct('.') {
            return Err(format!("no keyspace given for {}", first));
        }
        Ok((first, self.name()?))
    }

    /// Source text of a balanced group starting at the current `open`
    fn raw_group(&mut self, open: char, close: char) -> ParseResult<String> {
        let start = self.tokens.get(self.pos).map(|s| s.start).unwrap_or(0);
        self.punct(open)?;
        let mut depth = 1;
        let mut end = start;
        while depth > 0 {
            let span = self
                .tokens
                .get(self.pos)
                .ok_or_else(|| format!("unbalanced '{}'", open))?;
            end = span.end;
            match span.token {
                Token::Punct(c) if c == open => depth += 1,
                Token::Punct(c) if c == close => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
        Ok(self.src[start..end].to_string())
    }

    /// Type text up to the next `,` or `)` outside angle brackets
    fn column_type(&mut self) -> ParseResult<ColumnType> {
        let start = self
            .tokens
            .get(self.pos)
            .map(|s| s.start)
            .ok_or_else(|| "expected a type".to_string())?;
        let mut end = start;
        let mut depth = 0usize;
        while let Some(span) = self.tokens.get(self.pos) {
            match &span.token {
                Token::Punct('<') => depth += 1,
                Token::Punct('>') => depth = depth.saturating_sub(1),
                Token::Punct(',') | Token::Punct(')') if depth == 0 => break,
                Token::Word(w)
                    if depth == 0
                        && (w.eq_ignore_ascii_case("static")
                            || w.eq_ignore_ascii_case("primary")) =>
                {
                    break
                }
                _ => {}
            }
            end = span.end;
            self.pos += 1;
        }
        self.src[start..end]
            .parse::<ColumnType>()
            .map_err(|e| e.to_string())
    }

    fn literal(&mut self) -> ParseResult<Literal> {
        match self.next()? {
            Token::Word(w) if w.eq_ignore_ascii_case("null") => Ok(Literal::Null),
            Token::Word(w) => Ok(Literal::Word(w)),
            Token::Str(s) => Ok(Literal::Str(s)),
            Token::Ident(i) => Ok(Literal::Ident(i)),
            Token::Punct('[') => Ok(Literal::List(self.literal_list(']')?)),
            Token::Punct('(') => Ok(Literal::Tuple(self.literal_list(')')?)),
            Token::Punct('{') => {
                let mut entries = Vec::new();
                if self.eat_punct('}') {
                    return Ok(Literal::Braces(entries));
                }
                loop {
                    let key = self.literal()?;
                    let value = if self.eat_punct(':') {
                        Some(self.literal()?)
                    } else {
                        None
                    };
                    entries.push((key, value));
                    if self.eat_punct('}') {
                        return Ok(Literal::Braces(entries));
                    }
                    self.punct(',')?;
                }
            }
            other => Err(format!("expected a literal, found {:?}", other)),
        }
    }

    fn literal_list(&mut self, close: char) -> ParseResult<Vec<Literal>> {
        let mut items = Vec::new();
        if self.eat_punct(close) {
            return Ok(items);
        }
        loop {
            items.push(self.literal()?);
            if self.eat_punct(close) {
                return Ok(items);
            }
            self.punct(',')?;
        }
    }

    fn conditions(&mut self) -> ParseResult<Vec<(String, Literal)>> {
        let mut filter = Vec::new();
        loop {
            let column = self.name()?;
            self.punct('=')?;
            filter.push((column, self.literal()?));
            if !self.eat_keyword("AND") {
                return Ok(filter);
            }
        }
    }

    fn finish(&mut self) -> ParseResult<()> {
        self.eat_punct(';');
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(format!("unexpected trailing {:?}", t)),
        }
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        let statement = if self.eat_keyword("CREATE") {
            if self.eat_keyword("KEYSPACE") {
                self.create_keyspace()?
            } else if self.eat_keyword("TYPE") {
                self.create_type()?
            } else if self.eat_keyword("TABLE") || self.eat_keyword("COLUMNFAMILY") {
                self.create_table()?
            } else if self.eat_keyword("CUSTOM") {
                self.keyword("INDEX")?;
                self.create_index(true)?
            } else if self.eat_keyword("INDEX") {
                self.create_index(false)?
            } else {
                return Err(format!("unsupported CREATE near {:?}", self.peek()));
            }
        } else if self.eat_keyword("DROP") {
            if self.eat_keyword("KEYSPACE") {
                let if_exists = self.if_exists()?;
                Statement::DropKeyspace {
                    if_exists,
                    name: self.name()?,
                }
            } else if self.eat_keyword("TABLE") || self.eat_keyword("COLUMNFAMILY") {
                let if_exists = self.if_exists()?;
                let (keyspace, table) = self.qualified_name()?;
                Statement::DropTable {
                    keyspace,
                    table,
                    if_exists,
                }
            } else {
                return Err(format!("unsupported DROP near {:?}", self.peek()));
            }
        } else if self.eat_keyword("INSERT") {
            self.insert()?
        } else if self.eat_keyword("UPDATE") {
            self.update()?
        } else if self.eat_keyword("SELECT") {
            self.select()?
        } else {
            return Err(format!("unsupported statement near {:?}", self.peek()));
        };
        self.finish()?;
        Ok(statement)
    }

    fn create_keyspace(&mut self) -> ParseResult<Statement> {
        let if_not_exists = self.if_not_exists()?;
        let name = self.name()?;
        self.keyword("WITH")?;
        let mut replication = BTreeMap::new();
        let mut durable_writes = true;
        loop {
            let option = self.name()?;
            self.punct('=')?;
            match option.as_str() {
                "replication" => {
                    let Literal::Braces(entries) = self.literal()? else {
                        return Err("replication must be a map".to_string());
                    };
                    for (k, v) in entries {
                        match (k, v) {
                            (Literal::Str(k), Some(Literal::Str(v) | Literal::Word(v))) => {
                                replication.insert(k, v);
                            }
                            other => return Err(format!("bad replication entry {:?}", other)),
                        }
                    }
                }
                "durable_writes" => {
                    durable_writes = !matches!(self.literal()?, Literal::Word(w) if w.eq_ignore_ascii_case("false"));
                }
                other => return Err(format!("unknown keyspace option {}", other)),
            }
            if !self.eat_keyword("AND") {
                break;
            }
        }
        Ok(Statement::CreateKeyspace {
            name,
            if_not_exists,
            replication,
            durable_writes,
        })
    }

    fn create_type(&mut self) -> ParseResult<Statement> {
        self.if_not_exists()?;
        let (keyspace, name) = self.qualified_name()?;
        self.punct('(')?;
        let mut fields = Vec::new();
        loop {
            let field = self.name()?;
            fields.push((field, self.column_type()?));
            if self.eat_punct(')') {
                break;
            }
            self.punct(',')?;
        }
        Ok(Statement::CreateType {
            keyspace,
            name,
            fields,
        })
    }

    fn create_table(&mut self) -> ParseResult<Statement> {
        let if_not_exists = self.if_not_exists()?;
        let (keyspace, name) = self.qualified_name()?;
        self.punct('(')?;

        let mut columns: Vec<(String, ColumnType, bool)> = Vec::new();
        let mut partition: Vec<String> = Vec::new();
        let mut clustering: Vec<String> = Vec::new();
        loop {
            if self.eat_keyword("PRIMARY") {
                self.keyword("KEY")?;
                self.punct('(')?;
                if self.eat_punct('(') {
                    loop {
                        partition.push(self.name()?);
                        if self.eat_punct(')') {
                            break;
                        }
                        self.punct(',')?;
                    }
                } else {
                    partition.push(self.name()?);
                }
                while self.eat_punct(',') {
                    clustering.push(self.name()?);
                }
                self.punct(')')?;
            } else {
                let column = self.name()?;
                let column_type = self.column_type()?;
                let is_static = self.eat_keyword("STATIC");
                if self.eat_keyword("PRIMARY") {
                    self.keyword("KEY")?;
                    partition = vec![column.clone()];
                }
                columns.push((column, column_type, is_static));
            }
            if self.eat_punct(')') {
                break;
            }
            self.punct(',')?;
        }

        let mut orders: BTreeMap<String, ClusteringOrder> = BTreeMap::new();
        let mut options = BTreeMap::new();
        if self.eat_keyword("WITH") {
            loop {
                if self.eat_keyword("CLUSTERING") {
                    self.keyword("ORDER")?;
                    self.keyword("BY")?;
                    self.punct('(')?;
                    loop {
                        let column = self.name()?;
                        let order = if self.eat_keyword("DESC") {
                            ClusteringOrder::Desc
                        } else {
                            self.eat_keyword("ASC");
                            ClusteringOrder::Asc
                        };
                        orders.insert(column, order);
                        if self.eat_punct(')') {
                            break;
                        }
                        self.punct(',')?;
                    }
                } else {
                    let option = self.name()?;
                    self.punct('=')?;
                    let value = if self.peek() == Some(&Token::Punct('{')) {
                        self.raw_group('{', '}')?
                    } else {
                        let start = self.tokens.get(self.pos).map(|s| (s.start, s.end));
                        self.next()?;
                        let (s, e) = start.unwrap_or((0, 0));
                        self.src[s..e].to_string()
                    };
                    options.insert(option, value);
                }
                if !self.eat_keyword("AND") {
                    break;
                }
            }
        }

        if partition.is_empty() {
            return Err(format!("table {}.{} has no primary key", keyspace, name));
        }
        let mut table = TableMetadata::new(&keyspace, &name);
        table.options = options;
        for (column, column_type, is_static) in columns {
            let metadata = if let Some(i) = partition.iter().position(|p| *p == column) {
                ColumnMetadata::partition_key(column, column_type, i as i32)
            } else if let Some(i) = clustering.iter().position(|c| *c == column) {
                let order = orders.get(&column).copied().unwrap_or(ClusteringOrder::Asc);
                ColumnMetadata::clustering(column, column_type, i as i32, order)
            } else if is_static {
                ColumnMetadata::static_column(column, column_type)
            } else {
                ColumnMetadata::regular(column, column_type)
            };
            table.add_column(metadata);
        }
        for key in partition.iter().chain(&clustering) {
            if table.column(key).is_none() {
                return Err(format!("unknown primary key column {}", key));
            }
        }
        Ok(Statement::CreateTable {
            if_not_exists,
            table,
        })
    }

    fn create_index(&mut self, custom: bool) -> ParseResult<Statement> {
        self.if_not_exists()?;
        let explicit = if self.at_keyword("ON") {
            None
        } else {
            Some(self.name()?)
        };
        self.keyword("ON")?;
        let (keyspace, table) = self.qualified_name()?;
        let group = self.raw_group('(', ')')?;
        let target = group[1..group.len() - 1].trim().to_string();
        let kind = if custom {
            self.keyword("USING")?;
            match self.next()? {
                Token::Str(class_name) => IndexKind::Custom { class_name },
                other => return Err(format!("expected index class, found {:?}", other)),
            }
        } else {
            IndexKind::Composites
        };
        let name = explicit.unwrap_or_else(|| {
            let column: String = target
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            format!("{}_{}_idx", table, column)
        });
        Ok(Statement::CreateIndex {
            keyspace,
            table,
            index: IndexMetadata { name, target, kind },
        })
    }

    fn insert(&mut self) -> ParseResult<Statement> {
        self.keyword("INTO")?;
        let (keyspace, table) = self.qualified_name()?;
        self.punct('(')?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.name()?);
            if self.eat_punct(')') {
                break;
            }
            self.punct(',')?;
        }
        self.keyword("VALUES")?;
        self.punct('(')?;
        let values = self.literal_list(')')?;
        if values.len() != columns.len() {
            return Err(format!(
                "{} columns but {} values",
                columns.len(),
                values.len()
            ));
        }
        Ok(Statement::Insert {
            keyspace,
            table,
            columns,
            values,
        })
    }

    fn update(&mut self) -> ParseResult<Statement> {
        let (keyspace, table) = self.qualified_name()?;
        self.keyword("SET")?;
        let mut assignments = Vec::new();
        loop {
            let column = self.name()?;
            self.punct('=')?;
            let value = self.literal()?;
            let assignment = match value {
                Literal::Ident(ref same) | Literal::Word(ref same)
                    if same.eq_ignore_ascii_case(&column) && self.eat_punct('+') =>
                {
                    Assignment::Increment(column, self.literal()?)
                }
                other => Assignment::Set(column, other),
            };
            assignments.push(assignment);
            if !self.eat_punct(',') {
                break;
            }
        }
        self.keyword("WHERE")?;
        let filter = self.conditions()?;
        Ok(Statement::Update {
            keyspace,
            table,
            assignments,
            filter,
        })
    }

    fn select(&mut self) -> ParseResult<Statement> {
        self.punct('*')?;
        self.keyword("FROM")?;
        let (keyspace, table) = self.qualified_name()?;
        let mut filter = Vec::new();
        let mut limit = None;
        if self.eat_keyword("WHERE") {
            filter = self.conditions()?;
        }
        loop {
            if self.eat_keyword("LIMIT") {
                match self.next()? {
                    Token::Word(n) => {
                        limit = Some(n.parse().map_err(|_| format!("bad LIMIT {}", n))?)
                    }
                    other => return Err(format!("bad LIMIT {:?}", other)),
                }
            } else if self.eat_keyword("ALLOW") {
                self.keyword("FILTERING")?;
            } else {
                break;
            }
        }
        Ok(Statement::Select {
            keyspace,
            table,
            filter,
            limit,
        })
    }
}

/// Parse one statement
pub(crate) fn parse(src: &str) -> ParseResult<Statement> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    parser.statement()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqldump_core::{ColumnKind, KeyspaceMetadata};

    #[test]
    fn test_tokenize_mixed() {
        let tokens: Vec<Token> = tokenize("\"a\"\"b\" = 'it''s' + -1.5e-3")
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a\"b".into()),
                Token::Punct('='),
                Token::Str("it's".into()),
                Token::Punct('+'),
                Token::Word("-1.5e-3".into()),
            ]
        );
    }

    #[test]
    fn test_parse_rendered_table() {
        let table = TableMetadata::new("ks", "events")
            .with_column(ColumnMetadata::partition_key("day", ColumnType::Date, 0))
            .with_column(ColumnMetadata::clustering(
                "at",
                ColumnType::Timestamp,
                0,
                ClusteringOrder::Desc,
            ))
            .with_column(ColumnMetadata::static_column("note", ColumnType::Text))
            .with_column(ColumnMetadata::regular(
                "tags",
                "map<text, frozen<list<int>>>".parse().unwrap(),
            ));
        let mut table = table;
        table
            .options
            .insert("comment".into(), "'daily events'".into());
        table.options.insert(
            "compaction".into(),
            "{'class': 'SizeTieredCompactionStrategy'}".into(),
        );

        let cql = table.as_cql();
        match parse(cql.trim_end_matches(';')).unwrap() {
            Statement::CreateTable { table: parsed, .. } => assert_eq!(parsed, table),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rendered_keyspace() {
        let ks = KeyspaceMetadata::simple("Shop", 3);
        match parse(&ks.create_keyspace_cql()).unwrap() {
            Statement::CreateKeyspace {
                name,
                replication,
                durable_writes,
                ..
            } => {
                assert_eq!(name, "Shop");
                assert_eq!(replication, ks.replication);
                assert!(durable_writes);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_counter_update() {
        match parse("UPDATE \"ks\".\"t\" SET \"c\" = \"c\" + 5 WHERE \"k\" = 'a' AND \"n\" = 1")
            .unwrap()
        {
            Statement::Update {
                assignments,
                filter,
                ..
            } => {
                assert_eq!(
                    assignments,
                    vec![Assignment::Increment("c".into(), Literal::Word("5".into()))]
                );
                assert_eq!(filter.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_filter_select() {
        match parse("SELECT * FROM ks.t WHERE id = 3 ALLOW FILTERING LIMIT 5").unwrap() {
            Statement::Select {
                keyspace,
                table,
                filter,
                limit,
            } => {
                assert_eq!((keyspace.as_str(), table.as_str()), ("ks", "t"));
                assert_eq!(filter, vec![("id".to_string(), Literal::Word("3".into()))]);
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_inline_primary_key() {
        match parse("CREATE TABLE ks.t (id int PRIMARY KEY, v text)").unwrap() {
            Statement::CreateTable { table, .. } => {
                assert_eq!(table.column("id").unwrap().kind, ColumnKind::PartitionKey);
                assert_eq!(table.column("v").unwrap().kind, ColumnKind::Regular);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_index() {
        match parse("CREATE INDEX \"by_name\" ON \"ks\".\"t\" (name)").unwrap() {
            Statement::CreateIndex { index, .. } => {
                assert_eq!(index.name, "by_name");
                assert_eq!(index.target, "name");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_keyspace_rejected() {
        assert!(parse("INSERT INTO t (a) VALUES (1)").is_err());
    }
}
