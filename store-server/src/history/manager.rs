//! 命令历史（撤销/重做）
//!
//! - 执行新命令：压入撤销栈，清空重做栈，超过上限丢弃最旧的
//! - 撤销/重做失败：命令放回原栈，返回失败结果
//! - 存储被整体替换（远程水合、恢复备份）后，旧历史在下次调用时清空
//!
//! 锁顺序：history → store。store 从不回调 history。

use parking_lot::{Mutex, MutexGuard};
use shared::models::Editable;
use shared::OperationResult;
use std::collections::VecDeque;
use std::sync::Arc;

use super::command::{AddCommand, Command, DeleteCommand, UpdateCommand};
use crate::store::EntityStore;
use crate::utils::{AppError, AppResult};

/// 默认撤销深度
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

struct Stacks {
    undo: VecDeque<Box<dyn Command>>,
    redo: Vec<Box<dyn Command>>,
    /// 记录这些命令时存储的 generation
    generation: u64,
}

pub struct CommandHistory {
    store: Arc<EntityStore>,
    stacks: Mutex<Stacks>,
    limit: usize,
}

impl std::fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stacks = self.stacks.lock();
        f.debug_struct("CommandHistory")
            .field("undo", &stacks.undo.len())
            .field("redo", &stacks.redo.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl CommandHistory {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<EntityStore>, limit: usize) -> Self {
        let generation = store.generation();
        Self {
            store,
            stacks: Mutex::new(Stacks {
                undo: VecDeque::new(),
                redo: Vec::new(),
                generation,
            }),
            limit: limit.max(1),
        }
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// 取锁并丢弃过期历史
    fn lock(&self) -> MutexGuard<'_, Stacks> {
        let mut stacks = self.stacks.lock();
        let current = self.store.generation();
        if stacks.generation != current {
            if !stacks.undo.is_empty() || !stacks.redo.is_empty() {
                tracing::info!(
                    discarded_undo = stacks.undo.len(),
                    discarded_redo = stacks.redo.len(),
                    "Store was replaced, clearing command history"
                );
            }
            stacks.undo.clear();
            stacks.redo.clear();
            stacks.generation = current;
        }
        stacks
    }

    fn push_undo(&self, stacks: &mut Stacks, command: Box<dyn Command>) {
        stacks.undo.push_back(command);
        while stacks.undo.len() > self.limit {
            if let Some(dropped) = stacks.undo.pop_front() {
                tracing::debug!(command = %dropped.description(), "Oldest command dropped from history");
            }
        }
    }

    /// 执行命令并记录；失败时不入栈，错误原样返回
    pub fn execute(&self, mut command: Box<dyn Command>) -> AppResult<()> {
        let mut stacks = self.lock();
        command.execute(&self.store)?;
        tracing::debug!(command = %command.description(), "Command executed");
        stacks.redo.clear();
        self.push_undo(&mut stacks, command);
        Ok(())
    }

    // ========== 便捷入口（返回受影响记录） ==========

    pub fn add<E: Editable>(&self, create: E::Create) -> AppResult<E> {
        let mut stacks = self.lock();
        let mut command = AddCommand::<E>::new(create);
        command.execute(&self.store)?;
        let record = command
            .record()
            .cloned()
            .ok_or_else(|| AppError::internal("add command produced no record"))?;
        stacks.redo.clear();
        self.push_undo(&mut stacks, Box::new(command));
        Ok(record)
    }

    /// 记录不存在返回 `None`（不入栈）
    pub fn update<E: Editable>(&self, id: i64, patch: E::Patch) -> AppResult<Option<E>> {
        let mut stacks = self.lock();
        if self.store.get::<E>(id).is_none() {
            return Ok(None);
        }
        let mut command = UpdateCommand::<E>::new(id, patch);
        command.execute(&self.store)?;
        stacks.redo.clear();
        self.push_undo(&mut stacks, Box::new(command));
        Ok(self.store.get::<E>(id))
    }

    /// 记录不存在返回 `None`（不入栈）
    pub fn delete<E: Editable>(&self, id: i64) -> AppResult<Option<E>> {
        let mut stacks = self.lock();
        if self.store.get::<E>(id).is_none() {
            return Ok(None);
        }
        let mut command = DeleteCommand::<E>::new(id);
        command.execute(&self.store)?;
        let removed = command.removed().cloned();
        stacks.redo.clear();
        self.push_undo(&mut stacks, Box::new(command));
        Ok(removed)
    }

    // ========== 撤销 / 重做 ==========

    pub fn undo(&self) -> OperationResult {
        let mut stacks = self.lock();
        let Some(mut command) = stacks.undo.pop_back() else {
            return OperationResult::fail("Nothing to undo");
        };
        match command.undo(&self.store) {
            Ok(()) => {
                let message = format!("Undone: {}", command.description());
                tracing::info!("{message}");
                stacks.redo.push(command);
                OperationResult::ok(message)
            }
            Err(e) => {
                let message = format!("Undo failed for '{}': {e}", command.description());
                tracing::warn!("{message}");
                stacks.undo.push_back(command);
                OperationResult::fail(message)
            }
        }
    }

    pub fn redo(&self) -> OperationResult {
        let mut stacks = self.lock();
        let Some(mut command) = stacks.redo.pop() else {
            return OperationResult::fail("Nothing to redo");
        };
        match command.execute(&self.store) {
            Ok(()) => {
                let message = format!("Redone: {}", command.description());
                tracing::info!("{message}");
                self.push_undo(&mut stacks, command);
                OperationResult::ok(message)
            }
            Err(e) => {
                let message = format!("Redo failed for '{}': {e}", command.description());
                tracing::warn!("{message}");
                stacks.redo.push(command);
                OperationResult::fail(message)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.lock().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.lock().redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.lock().undo.back().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.lock().redo.last().map(|c| c.description())
    }

    pub fn undo_len(&self) -> usize {
        self.lock().undo.len()
    }

    pub fn clear(&self) {
        let mut stacks = self.lock();
        stacks.undo.clear();
        stacks.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::command::{AddLaptop, DeleteLaptop, UpdateLaptop};
    use shared::models::{Laptop, LaptopCreate, LaptopUpdate};
    use shared::StoreDocument;

    fn create(brand: &str) -> LaptopCreate {
        LaptopCreate {
            brand: brand.to_string(),
            model: "Book".to_string(),
            price: 900.0,
            cost: 500.0,
            quantity: 3,
            ..Default::default()
        }
    }

    fn history() -> CommandHistory {
        CommandHistory::new(Arc::new(EntityStore::in_memory()))
    }

    #[test]
    fn test_undo_redo_inverse_law() {
        let history = history();
        let store = history.store().clone();
        store.add_laptop(create("Base")).unwrap();
        store.add_laptop(create("Other")).unwrap();
        let initial = store.get_laptops();

        history.execute(Box::new(AddLaptop::new(create("New")))).unwrap();
        history
            .execute(Box::new(UpdateLaptop::new(
                1,
                LaptopUpdate {
                    price: Some(950.0),
                    quantity: Some(1),
                    ..Default::default()
                },
            )))
            .unwrap();
        history.execute(Box::new(DeleteLaptop::new(1))).unwrap();
        let after = store.get_laptops();

        for _ in 0..3 {
            assert!(history.undo().success);
        }
        assert_eq!(store.get_laptops(), initial);

        for _ in 0..3 {
            assert!(history.redo().success);
        }
        let redone = store.get_laptops();
        assert_eq!(
            redone.iter().map(|l| (l.id, l.brand.clone(), l.price)).collect::<Vec<_>>(),
            after.iter().map(|l| (l.id, l.brand.clone(), l.price)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_messages_embed_description() {
        let history = history();
        history.add::<Laptop>(create("Dell")).unwrap();
        let undone = history.undo();
        assert!(undone.success);
        assert_eq!(undone.message, "Undone: Add laptop Dell Book");
        let redone = history.redo();
        assert_eq!(redone.message, "Redone: Add laptop Dell Book");
    }

    #[test]
    fn test_empty_stacks_fail() {
        let history = history();
        assert!(!history.undo().success);
        assert!(!history.redo().success);
        assert!(history.undo_description().is_none());
    }

    #[test]
    fn test_new_command_after_undo_clears_redo() {
        let history = history();
        history.add::<Laptop>(create("A")).unwrap();
        history.undo();
        assert!(history.can_redo());
        history.add::<Laptop>(create("B")).unwrap();
        assert!(!history.can_redo());
        assert!(!history.redo().success);
    }

    #[test]
    fn test_history_is_bounded() {
        let history = history();
        for i in 0..(DEFAULT_HISTORY_LIMIT + 1) {
            history.add::<Laptop>(create(&format!("L{i}"))).unwrap();
        }
        assert_eq!(history.undo_len(), DEFAULT_HISTORY_LIMIT);
        for _ in 0..DEFAULT_HISTORY_LIMIT {
            assert!(history.undo().success);
        }
        assert!(!history.undo().success);
        // the first laptop was never undoable
        let remaining = history.store().get_laptops();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].brand, "L0");
    }

    #[test]
    fn test_failed_undo_returns_command_to_stack() {
        let history = history();
        let laptop = history.add::<Laptop>(create("Gone")).unwrap();
        // removed outside the history
        history.store().delete_laptop(laptop.id).unwrap();
        let result = history.undo();
        assert!(!result.success);
        assert!(history.can_undo());
        assert_eq!(history.undo_description().as_deref(), Some("Add laptop Gone Book"));
    }

    #[test]
    fn test_store_replacement_clears_history() {
        let history = history();
        history.add::<Laptop>(create("A")).unwrap();
        history.store().apply_primary(StoreDocument::default());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_update_missing_returns_none() {
        let history = history();
        let updated = history.update::<Laptop>(5, LaptopUpdate::default()).unwrap();
        assert!(updated.is_none());
        assert!(!history.can_undo());
    }
}
