//! End-to-end completion scenarios
//!
//! Drives the services against an on-disk libsql database and checks the
//! rollup rules, structural rejections and the atomicity of multi-record
//! writes.

#[cfg(test)]
mod completion_scenarios {
    use anyhow::Result;
    use completionist_core::db::{DatabaseService, DomainEvent, RecordStore, TursoStore};
    use completionist_core::models::{MediaType, MilestoneType, RecomputeRequest};
    use completionist_core::services::{
        BatchCreateMilestones, CoreServices, CreateEntry, CreateMilestone, ErrorCategory,
    };
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::time::{timeout, Duration};

    struct TestEnv {
        services: CoreServices,
        store: Arc<dyn RecordStore>,
        _temp_dir: TempDir,
    }

    async fn create_test_env() -> Result<TestEnv> {
        let temp_dir = TempDir::new()?;
        let db = DatabaseService::new(temp_dir.path().join("scenarios.db")).await?;
        let store: Arc<dyn RecordStore> = Arc::new(TursoStore::new(Arc::new(db)));
        Ok(TestEnv {
            services: CoreServices::new(store.clone()),
            store,
            _temp_dir: temp_dir,
        })
    }

    async fn game_entry(env: &TestEnv, franchise_id: &str, title: &str) -> Result<String> {
        let entry = env
            .services
            .entries
            .create(CreateEntry::new(franchise_id, title, MediaType::Game))
            .await?;
        Ok(entry.id)
    }

    // ========================================================================
    // Rollup rules
    // ========================================================================

    #[tokio::test]
    async fn test_group_with_counter_and_nested_checkboxes() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Hollow Knight", "#64748b").await?;
        let entry_id = game_entry(&env, &franchise.id, "Hollow Knight").await?;
        let m = &env.services.milestones;

        let root = m.create(CreateMilestone::checkbox(&entry_id, "Root")).await?;
        let counter = m
            .create(CreateMilestone::counter(&entry_id, "Grubs", 10).under(&root.id))
            .await?;
        let group = m
            .create(CreateMilestone::checkbox(&entry_id, "Bosses").under(&root.id))
            .await?;
        let on = m
            .create(CreateMilestone::checkbox(&entry_id, "Hornet").under(&group.id))
            .await?;
        m.create(CreateMilestone::checkbox(&entry_id, "Radiance").under(&group.id))
            .await?;

        m.set_current(&counter.id, 4).await?;
        m.increment(&on.id, 1).await?;

        let tree = m.tree(&entry_id).await?;
        assert_eq!(tree.len(), 1);
        assert!((tree[0].completion.percent - 45.0).abs() < 1e-9);
        assert_eq!(tree[0].completion.completed, 5);
        assert_eq!(tree[0].completion.total, 12);

        let entry = env.services.completion.entry_completion(&entry_id).await?;
        assert!((entry.percent - 45.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_branch_weighting_is_unweighted() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Celeste", "#ec4899").await?;
        let entry_id = game_entry(&env, &franchise.id, "Celeste").await?;
        let m = &env.services.milestones;

        let root = m.create(CreateMilestone::checkbox(&entry_id, "Root")).await?;
        let one = m
            .create(CreateMilestone::checkbox(&entry_id, "One").under(&root.id))
            .await?;
        let single = m
            .create(CreateMilestone::checkbox(&entry_id, "Single").under(&one.id))
            .await?;
        let many = m
            .create(CreateMilestone::checkbox(&entry_id, "Many").under(&root.id))
            .await?;
        m.batch_create(BatchCreateMilestones {
            entry_id: entry_id.clone(),
            parent_id: Some(many.id.clone()),
            titles: vec!["a".into(), "b".into(), "c".into()],
            kind: MilestoneType::Checkbox,
            target: None,
        })
        .await?;
        m.set_current(&single.id, 1).await?;

        let completion = env.services.completion.entry_completion(&entry_id).await?;
        assert_eq!(completion.percent, 50.0);
        assert_eq!(completion.completed, 1);
        assert_eq!(completion.total, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_franchise_rollup_respects_optional_entries() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Witcher", "#dc2626").await?;

        let mut optional = CreateEntry::new(&franchise.id, "Gwent", MediaType::Game);
        optional.is_optional = true;
        let optional = env.services.entries.create(optional).await?;
        let main = env
            .services
            .entries
            .create(CreateEntry::new(&franchise.id, "The Last Wish", MediaType::Book))
            .await?;

        let seeded = env.store.list_milestones(&main.id).await?;
        env.services.milestones.set_current(&seeded[0].id, 1).await?;
        env.services
            .milestones
            .create(CreateMilestone::checkbox(&optional.id, "Collect all cards"))
            .await?;

        let required_only = env
            .services
            .completion
            .franchise_completion(&franchise.id, false)
            .await?;
        assert_eq!(required_only.percent, 100.0);

        let everything = env
            .services
            .completion
            .franchise_completion(&franchise.id, true)
            .await?;
        assert_eq!(everything.percent, 50.0);
        assert_eq!(everything.entry_count, 2);
        Ok(())
    }

    // ========================================================================
    // Structural rejections
    // ========================================================================

    #[tokio::test]
    async fn test_cycle_rejected_and_nothing_changes() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Portal", "#f59e0b").await?;
        let entry_id = game_entry(&env, &franchise.id, "Portal 2").await?;
        let m = &env.services.milestones;

        let a = m.create(CreateMilestone::checkbox(&entry_id, "A")).await?;
        let b = m.create(CreateMilestone::checkbox(&entry_id, "B").under(&a.id)).await?;
        let c = m.create(CreateMilestone::checkbox(&entry_id, "C").under(&b.id)).await?;

        let before = env.store.list_milestones(&entry_id).await?;
        let err = m.reparent(&a.id, Some(&c.id)).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);

        let self_parent = m.reparent(&a.id, Some(&a.id)).await.unwrap_err();
        assert_eq!(self_parent.category(), ErrorCategory::Validation);

        assert_eq!(env.store.list_milestones(&entry_id).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_across_entries_rejected() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Halo", "#16a34a").await?;
        let first = game_entry(&env, &franchise.id, "Halo CE").await?;
        let second = game_entry(&env, &franchise.id, "Halo 2").await?;

        let moving = env
            .services
            .milestones
            .create(CreateMilestone::checkbox(&first, "Legendary"))
            .await?;
        let foreign = env
            .services
            .milestones
            .create(CreateMilestone::checkbox(&second, "Skulls"))
            .await?;

        let err = env
            .services
            .milestones
            .reparent(&moving.id, Some(&foreign.id))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_keeps_original_untouched() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Doom", "#b91c1c").await?;
        let entry_id = game_entry(&env, &franchise.id, "Doom Eternal").await?;
        let m = &env.services.milestones;

        let root = m.create(CreateMilestone::checkbox(&entry_id, "Slayer Gates")).await?;
        let counter = m
            .create(CreateMilestone::counter(&entry_id, "Keys", 6).under(&root.id))
            .await?;
        m.set_current(&counter.id, 6).await?;
        let target = m.create(CreateMilestone::checkbox(&entry_id, "DLC")).await?;

        let before = env.store.list_milestones(&entry_id).await?;
        let copies = m.duplicate_subtree(&root.id, Some(&target.id)).await?;

        assert_eq!(copies.len(), 2);
        assert_eq!(copies[0].parent_id.as_deref(), Some(target.id.as_str()));
        assert_eq!(copies[0].display_order, 10);
        assert_eq!(copies[1].progress.current(), 0);
        assert_eq!(copies[1].progress.target(), Some(6));

        let after = env.store.list_milestones(&entry_id).await?;
        assert_eq!(after.len(), before.len() + 2);
        for original in &before {
            assert!(after.contains(original));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_delete_is_atomic_across_entries() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Dune", "#ca8a04").await?;
        let a = env
            .services
            .entries
            .create(CreateEntry::new(&franchise.id, "Dune", MediaType::Book))
            .await?;
        let b = env
            .services
            .entries
            .create(CreateEntry::new(&franchise.id, "Dune", MediaType::Movie))
            .await?;

        let result = env
            .services
            .entries
            .bulk_delete(&[a.id.clone(), b.id.clone()])
            .await?;
        assert_eq!(result.milestone_count, 2);
        assert!(env.store.list_milestones(&a.id).await?.is_empty());
        assert!(env.store.get_entry(&b.id).await?.is_none());

        env.services.franchises.delete(&franchise.id).await?;
        Ok(())
    }

    // ========================================================================
    // Events and recompute
    // ========================================================================

    #[tokio::test]
    async fn test_mutation_event_names_scope_for_recompute() -> Result<()> {
        let env = create_test_env().await?;
        let franchise = env.services.franchises.create("Pikmin", "#4ade80").await?;
        let entry_id = game_entry(&env, &franchise.id, "Pikmin 4").await?;
        let leaf = env
            .services
            .milestones
            .create(CreateMilestone::counter(&entry_id, "Treasures", 4))
            .await?;

        let mut rx = env.services.subscribe_to_events();
        env.services.milestones.increment(&leaf.id, 2).await?;

        let event = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("event should be emitted within 1 second")?;
        let scope = match &event {
            DomainEvent::MilestoneUpdated { milestone } => {
                assert_eq!(milestone.progress.current(), 2);
                event.scope()
            }
            other => panic!("expected MilestoneUpdated, got {:?}", other),
        };

        let refreshed = env
            .services
            .completion
            .recompute(RecomputeRequest {
                entry_id: scope.entry_id,
                franchise_id: Some(franchise.id.clone()),
                include_optional_entries: true,
            })
            .await?;
        assert_eq!(refreshed.entry.map(|e| e.percent), Some(50.0));
        assert_eq!(refreshed.franchise.map(|f| f.percent), Some(50.0));
        assert_eq!(refreshed.milestones.len(), 1);
        Ok(())
    }
}
