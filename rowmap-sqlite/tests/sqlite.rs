#[cfg(test)]
mod tests {
    use rowmap_core::Connection;
    use rowmap_sqlite::SQLiteConnection;
    use rowmap_tests::{execute_tests, init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).await.expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        assert!(
            !Path::new(DB_PATH).exists(),
            "Database file should not exist before test"
        );
        let connection = SQLiteConnection::connect(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        execute_tests(connection).await;
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created by the first statement"
        );
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(SQLiteConnection::connect("mysql://localhost/database").is_err());
            assert!(SQLiteConnection::connect("sqlite://").is_err());
        };
    }
}
