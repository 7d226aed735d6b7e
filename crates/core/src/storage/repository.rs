//! Generic repository composition.
//!
//! A domain repository is a schema, a backend, a transform and a list of
//! search fields. [`EntityRepository`] binds the four and implements the
//! [`Repository`] contract on top of any [`Backend`].

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::schema::Schema;

use super::{Backend, Entity, ListParams, ListRequest, Page, Record, Repository, Result, Transform};

pub struct EntityRepository<T, B: Backend> {
    backend: B,
    transform: Transform<B::Raw>,
    search_fields: Vec<String>,
    create_schema: Schema,
    update_schema: Schema,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, B: Backend> EntityRepository<T, B> {
    pub fn new(backend: B, transform: Transform<B::Raw>, search_fields: &[&str]) -> Self {
        let schema = T::schema();
        Self {
            backend,
            transform,
            search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
            create_schema: schema.omit(&["id"]).partial(),
            update_schema: schema.partial(),
            _entity: PhantomData,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    /// Runs a backend record through the transform and the schema.
    fn decode(&self, raw: B::Raw) -> Result<T> {
        let value = (self.transform)(raw);
        let validated = T::schema().validate(&value)?;
        Ok(serde_json::from_value(validated)?)
    }
}

#[async_trait]
impl<T: Entity, B: Backend> Repository<T> for EntityRepository<T, B> {
    async fn get(&self, params: ListParams) -> Result<Page<T>> {
        let request = ListRequest::from_params(&params, &self.search_fields);
        tracing::debug!(
            entity = T::NAME,
            backend = self.backend.name(),
            offset = request.offset,
            limit = request.limit,
            predicates = request.predicates.len(),
            "Listing"
        );

        let page = self
            .backend
            .list(&request)
            .await
            .map_err(|e| e.for_entity(T::NAME))?;

        let data = page
            .records
            .into_iter()
            .map(|raw| self.decode(raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            data,
            count: page.count,
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<T> {
        let raw = self
            .backend
            .find(id)
            .await
            .map_err(|e| e.for_entity(T::NAME))?;
        self.decode(raw)
    }

    async fn create(&self, data: Record) -> Result<T> {
        self.create_schema.check_input(&data)?;
        let raw = self
            .backend
            .insert(data)
            .await
            .map_err(|e| e.for_entity(T::NAME))?;
        self.decode(raw)
    }

    async fn update(&self, id: &str, data: Record) -> Result<T> {
        self.update_schema.check_input(&data)?;
        let raw = self
            .backend
            .modify(id, data)
            .await
            .map_err(|e| e.for_entity(T::NAME))?;
        self.decode(raw)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.backend
            .remove(id)
            .await
            .map_err(|e| e.for_entity(T::NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{LazyLock, Mutex};

    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};

    use super::*;
    use crate::schema::Field;
    use crate::search::{matches_all, matches_query, sort_records, SearchCondition, SearchOperator};
    use crate::storage::{identity, to_record, Direction, RawPage, RepositoryError};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: String,
        email: String,
        #[serde(default)]
        age: Option<i64>,
        active: bool,
    }

    static PERSON_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
        Schema::new(vec![
            Field::string("id"),
            Field::string("email"),
            Field::integer("age").optional(),
            Field::boolean("active"),
        ])
    });

    impl Entity for Person {
        const NAME: &'static str = "Person";

        fn schema() -> &'static Schema {
            &PERSON_SCHEMA
        }
    }

    /// Vec-backed backend that evaluates requests with the in-memory matcher.
    #[derive(Default)]
    struct VecBackend {
        rows: Mutex<Vec<Record>>,
    }

    impl VecBackend {
        fn with_rows(rows: Vec<Value>) -> Self {
            Self {
                rows: Mutex::new(rows.into_iter().map(|r| to_record(r).unwrap()).collect()),
            }
        }
    }

    #[async_trait]
    impl Backend for VecBackend {
        type Raw = Value;

        fn name(&self) -> &'static str {
            "vec"
        }

        async fn list(&self, request: &ListRequest) -> Result<RawPage<Value>> {
            let rows = self.rows.lock().unwrap().clone();
            let mut matched: Vec<Record> = rows
                .into_iter()
                .filter(|r| {
                    request
                        .query
                        .as_deref()
                        .is_none_or(|q| matches_query(r, q, &request.search_fields))
                })
                .filter(|r| matches_all(r, &request.predicates))
                .collect();
            if let Some(order) = &request.order {
                sort_records(&mut matched, order, request.direction);
            }
            let count = matched.len() as u64;
            let records = matched
                .into_iter()
                .skip(request.offset as usize)
                .take(request.limit as usize)
                .map(Value::Object)
                .collect();
            Ok(RawPage { records, count })
        }

        async fn find(&self, id: &str) -> Result<Value> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.get("id") == Some(&json!(id)))
                .cloned()
                .map(Value::Object)
                .ok_or_else(|| RepositoryError::not_found(id))
        }

        async fn insert(&self, mut data: Record) -> Result<Value> {
            let mut rows = self.rows.lock().unwrap();
            data.insert("id".to_string(), json!(format!("p{}", rows.len() + 1)));
            rows.push(data.clone());
            Ok(Value::Object(data))
        }

        async fn modify(&self, id: &str, patch: Record) -> Result<Value> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|r| r.get("id") == Some(&json!(id)))
                .ok_or_else(|| RepositoryError::not_found(id))?;
            row.extend(patch);
            Ok(Value::Object(row.clone()))
        }

        async fn remove(&self, id: &str) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| r.get("id") != Some(&json!(id)));
            if rows.len() == before {
                return Err(RepositoryError::not_found(id));
            }
            Ok(())
        }
    }

    fn repository(rows: Vec<Value>) -> EntityRepository<Person, VecBackend> {
        EntityRepository::new(VecBackend::with_rows(rows), identity, &["email"])
    }

    fn people() -> Vec<Value> {
        vec![
            json!({ "id": "1", "email": "test1@example.com", "age": 17, "active": true }),
            json!({ "id": "2", "email": "test2@example.com", "age": 20, "active": true }),
            json!({ "id": "3", "email": "another@example.com", "age": 35, "active": false }),
        ]
    }

    #[tokio::test]
    async fn test_get_applies_conditions() {
        let repo = repository(people());
        let params = ListParams::default()
            .condition(SearchCondition::new("age", SearchOperator::Gte, 18))
            .condition(SearchCondition::eq("active", true));

        let page = repo.get(params).await.unwrap();

        assert_eq!(page.count, 1);
        assert_eq!(page.data[0].id, "2");
    }

    #[tokio::test]
    async fn test_dropped_condition_equals_omitted_condition() {
        let repo = repository(people());
        let with_bad = ListParams::default()
            .condition(SearchCondition::new("email", SearchOperator::Contains, 42))
            .condition(SearchCondition::new("age", SearchOperator::from("~"), 1))
            .condition(SearchCondition::eq("active", true));
        let without = ListParams::default().condition(SearchCondition::eq("active", true));

        assert_eq!(
            repo.get(with_bad).await.unwrap(),
            repo.get(without).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_query_and_sort() {
        let repo = repository(people());
        let page = repo
            .get(ListParams::default().query("TEST").order_by("age", Direction::Desc))
            .await
            .unwrap();

        let ids: Vec<&str> = page.data.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(page.count, 2);
    }

    #[tokio::test]
    async fn test_pagination_tail() {
        let rows = (0..25)
            .map(|i| json!({ "id": format!("{i}"), "email": format!("u{i}@x.io"), "active": true }))
            .collect();
        let repo = repository(rows);

        let page = repo.get(ListParams::new(20, 10)).await.unwrap();

        assert_eq!(page.count, 25);
        assert_eq!(page.data.len(), 5);
    }

    #[tokio::test]
    async fn test_not_found_is_attributed_to_entity() {
        let repo = repository(people());

        let err = repo.find_by_id("missing").await.unwrap_err();
        assert_eq!(
            err,
            RepositoryError::NotFound {
                entity_type: "Person",
                id: "missing".to_string(),
            }
        );
        assert!(repo.update("missing", Record::new()).await.unwrap_err().is_not_found());
        assert!(repo.delete("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_non_conforming_record_fails_validation() {
        let repo = repository(vec![json!({ "id": "1", "email": 7, "active": "yes" })]);

        let err = repo.find_by_id("1").await.unwrap_err();
        match err {
            RepositoryError::Validation(validation) => assert_eq!(validation.issues.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_checks_declared_fields_only() {
        let repo = repository(Vec::new());

        let bad = to_record(json!({ "email": "a@b.c", "active": "yes" })).unwrap();
        assert!(matches!(
            repo.create(bad).await,
            Err(RepositoryError::Validation(_))
        ));

        let good = to_record(json!({ "email": "a@b.c", "active": true })).unwrap();
        let created = repo.create(good).await.unwrap();
        assert_eq!(created.id, "p1");
        assert_eq!(repo.find_by_id("p1").await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_leaves_unspecified_fields() {
        let repo = repository(people());

        let patch = to_record(json!({ "active": false })).unwrap();
        let updated = repo.update("1", patch).await.unwrap();

        assert!(!updated.active);
        assert_eq!(updated.email, "test1@example.com");
        assert_eq!(updated.age, Some(17));
    }
}
