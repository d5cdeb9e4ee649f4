// SQL識別子クォートユーティリティ
//
// バインドできない位置（SHOW CREATE 文、OBJECT_ID の名前引数）に
// オブジェクト名を埋め込むための方言別クォート関数を提供します。

/// MySQL用識別子クォート（バッククォート）
///
/// 識別子内のバッククォートは二重にエスケープします。
///
/// # Examples
/// ```
/// use schemalens_db::adapters::sql_quote::quote_identifier_mysql;
/// assert_eq!(quote_identifier_mysql("users"), "`users`");
/// assert_eq!(quote_identifier_mysql("table`name"), "`table``name`");
/// ```
pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// SQL Server用識別子クォート（角括弧）
///
/// 識別子内の閉じ角括弧は二重にエスケープします。
///
/// # Examples
/// ```
/// use schemalens_db::adapters::sql_quote::quote_identifier_sqlserver;
/// assert_eq!(quote_identifier_sqlserver("orders"), "[orders]");
/// assert_eq!(quote_identifier_sqlserver("odd]name"), "[odd]]name]");
/// ```
pub fn quote_identifier_sqlserver(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}
