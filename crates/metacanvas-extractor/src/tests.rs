//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{ExtractionTask, ExtractorConfig, WorkerPool};
    use futures::future::join_all;
    use metacanvas_domain::{Concept, FieldDefinition, Vocabulary};
    use metacanvas_llm::MockProvider;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn text() -> Arc<str> {
        Arc::from("Workshop am 12. Mai in Berlin, Kosten 50 EUR")
    }

    fn pool_with_cap(llm: MockProvider, max_workers: usize) -> WorkerPool<MockProvider> {
        let config = ExtractorConfig {
            max_workers,
            ..Default::default()
        };
        WorkerPool::new(Arc::new(llm), &config)
    }

    #[tokio::test]
    async fn test_worker_cap_never_exceeded() {
        let llm = MockProvider::new("{}").with_delay(Duration::from_millis(10));
        let pool = pool_with_cap(llm.clone(), 3);

        let futures: Vec<_> = (0..20)
            .map(|i| {
                let field = Arc::new(FieldDefinition::new(format!("field_{}", i), "Feld"));
                pool.submit(ExtractionTask::new(field, text(), if i % 2 == 0 { 10 } else { 5 }))
            })
            .collect();

        let results = join_all(futures).await;

        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(llm.call_count(), 20);
        assert!(llm.max_in_flight() <= 3, "cap exceeded: {}", llm.max_in_flight());
        assert_eq!(llm.max_in_flight(), 3);
        assert_eq!(pool.status().active_workers, 0);
    }

    #[tokio::test]
    async fn test_required_fields_dequeue_first() {
        let llm = MockProvider::new("{}").with_delay(Duration::from_millis(20));
        let pool = pool_with_cap(llm.clone(), 1);

        // Occupies the only slot while the rest is queued
        let blocker = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("blocker", "Blocker")),
            text(),
            1,
        ));

        let order = [("opt_a", 5), ("req_a", 10), ("opt_b", 5), ("req_b", 10)];
        let futures: Vec<_> = order
            .iter()
            .map(|(id, priority)| {
                pool.submit(ExtractionTask::new(
                    Arc::new(FieldDefinition::new(*id, *id)),
                    text(),
                    *priority,
                ))
            })
            .collect();

        blocker.await.unwrap();
        join_all(futures).await;

        let fields: Vec<String> = llm
            .calls()
            .iter()
            .filter_map(|prompt| {
                prompt
                    .lines()
                    .find_map(|line| line.strip_prefix("Feld: "))
                    .and_then(|rest| rest.split(' ').next())
                    .map(str::to_string)
            })
            .collect();

        assert_eq!(fields, vec!["blocker", "req_a", "req_b", "opt_a", "opt_b"]);
    }

    #[tokio::test]
    async fn test_failing_task_frees_slot() {
        let llm = MockProvider::default()
            .with_error("Feld: broken (")
            .with_response("Feld: title (", r#"{"title": "Workshop"}"#);
        let pool = pool_with_cap(llm, 1);

        let broken = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("broken", "Kaputt")),
            text(),
            10,
        ));
        let title = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("title", "Titel")),
            text(),
            5,
        ));

        let broken = broken.await.unwrap();
        let title = title.await.unwrap();

        assert!(broken.is_error());
        assert_eq!(title.value, Some(json!("Workshop")));
        assert_eq!(pool.status().active_workers, 0);
    }

    #[tokio::test]
    async fn test_multivalued_and_price_parsing_through_pool() {
        let llm = MockProvider::default()
            .with_response("Feld: x (", r#"{"x": ["A", "", null, "B"]}"#)
            .with_response("Feld: price (", r#"{"price": {"amount": 120, "currency": "EUR"}}"#);
        let pool = pool_with_cap(llm, 2);

        let x = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("x", "X").multiple()),
            text(),
            5,
        ));
        let price = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("price", "Preis")),
            text(),
            5,
        ));

        assert_eq!(x.await.unwrap().value, Some(json!(["A", "B"])));
        assert_eq!(price.await.unwrap().value, Some(json!("120 EUR")));
    }

    #[tokio::test]
    async fn test_prompt_lists_vocabulary() {
        let llm = MockProvider::new(r#"{"format": "Workshop"}"#);
        let pool = pool_with_cap(llm.clone(), 1);

        let field = FieldDefinition::new("format", "Format").with_vocabulary(Vocabulary::closed(vec![
            Concept::new("Workshop"),
            Concept::new("Webinar"),
        ]));
        let result = pool
            .submit(ExtractionTask::new(Arc::new(field), text(), 10))
            .await
            .unwrap();

        assert_eq!(result.value, Some(json!("Workshop")));
        let prompt = &llm.calls()[0];
        assert!(prompt.contains("- Workshop\n- Webinar\n"));
    }

    #[tokio::test]
    async fn test_late_submissions_wait_in_priority_order() {
        let llm = MockProvider::new("{}").with_delay(Duration::from_millis(20));
        let pool = pool_with_cap(llm.clone(), 1);

        let first = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("first", "Erstes")),
            text(),
            5,
        ));
        let low = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("low", "Niedrig")),
            text(),
            5,
        ));
        tokio::time::sleep(Duration::from_millis(5)).await;
        let high = pool.submit(ExtractionTask::new(
            Arc::new(FieldDefinition::new("high", "Hoch")),
            text(),
            10,
        ));

        let _ = tokio::join!(first, low, high);

        let calls = llm.calls();
        assert!(calls[0].contains("Feld: first ("));
        assert!(calls[1].contains("Feld: high ("));
        assert!(calls[2].contains("Feld: low ("));
    }
}
