use regex::Regex;

pub fn sql(query: &str) -> String {
    let cleaned = query.split_whitespace().collect::<Vec<&str>>().join(" ");
    let re = Regex::new(r"\?").unwrap();
    let mut param_index = 1;
    let mut result = cleaned;
    while let Some(mat) = re.find(&result) {
        let replacement = format!("${}", param_index);
        result.replace_range(mat.range(), &replacement);
        param_index += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::sql;

    #[test]
    fn numbers_placeholders_in_order() {
        assert_eq!(
            sql("INSERT INTO t (a, b) VALUES (?, ?)"),
            "INSERT INTO t (a, b) VALUES ($1, $2)"
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            sql("SELECT\n    id\nFROM\n    t\nWHERE\n    id = ?"),
            "SELECT id FROM t WHERE id = $1"
        );
    }
}
