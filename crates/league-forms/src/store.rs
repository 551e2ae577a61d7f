//! Template store
//!
//! Every field mutation goes through one code path over pages: single-page
//! templates address their only page implicitly, multi-page templates must
//! name the page.

use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::model::{
    DisplayLocation, Field, FieldDraft, FieldId, FieldPatch, FieldType, FormTemplate, Page, PageDraft,
    PageId, PagePatch, TemplateDraft, TemplateId, TemplateIssue, TemplatePatch,
};
use crate::{FormsError, Result};

/// Ids below this are reserved for the built-in registration forms
pub const FIRST_TEMPLATE_ID: TemplateId = 5;
/// Field ids are allocated store-wide from here
pub const FIRST_FIELD_ID: FieldId = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

struct TemplateState {
    templates: BTreeMap<TemplateId, FormTemplate>,
    next_template_id: TemplateId,
    next_field_id: FieldId,
}

/// In-memory form template store
pub struct TemplateStore {
    state: RwLock<TemplateState>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TemplateState {
                templates: BTreeMap::new(),
                next_template_id: FIRST_TEMPLATE_ID,
                next_field_id: FIRST_FIELD_ID,
            }),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn list(&self) -> Vec<FormTemplate> {
        self.state.read().templates.values().cloned().collect()
    }

    pub fn get(&self, id: TemplateId) -> Option<FormTemplate> {
        self.state.read().templates.get(&id).cloned()
    }

    /// Active templates assigned to a category
    pub fn by_category(&self, category_id: u64) -> Vec<FormTemplate> {
        self.state
            .read()
            .templates
            .values()
            .filter(|t| t.active && t.category_ids.contains(&category_id))
            .cloned()
            .collect()
    }

    /// Active templates shown at a display location
    pub fn by_display_location(&self, location: DisplayLocation) -> Vec<FormTemplate> {
        self.state
            .read()
            .templates
            .values()
            .filter(|t| t.active && t.display_locations.contains(&location))
            .cloned()
            .collect()
    }

    pub fn validate(&self, id: TemplateId) -> Result<Vec<TemplateIssue>> {
        self.state
            .read()
            .templates
            .get(&id)
            .map(FormTemplate::issues)
            .ok_or(FormsError::TemplateNotFound(id))
    }

    // =========================================================================
    // Template CRUD
    // =========================================================================

    /// Store a new template with one empty page
    pub fn create(&self, draft: TemplateDraft) -> FormTemplate {
        let mut state = self.state.write();
        let id = state.next_template_id;
        state.next_template_id += 1;

        let template = FormTemplate::create(id, draft);
        state.templates.insert(id, template.clone());
        tracing::info!(template_id = id, name = %template.name, "form template created");
        template
    }

    /// Shallow-merge metadata. Activation is checked like [`Self::set_active`].
    pub fn update(&self, id: TemplateId, patch: TemplatePatch) -> Result<FormTemplate> {
        self.mutate(id, |template| {
            if patch.active == Some(true) && !template.active {
                ensure_usable(template)?;
            }
            if let Some(name) = patch.name {
                template.name = name;
            }
            if let Some(description) = patch.description {
                template.description = description;
            }
            if let Some(active) = patch.active {
                template.active = active;
            }
            if let Some(category_ids) = patch.category_ids {
                template.category_ids = category_ids;
            }
            if let Some(locations) = patch.display_locations {
                template.display_locations = locations;
            }
            Ok(template.clone())
        })
    }

    /// Toggle availability; activation is refused while the template has issues
    pub fn set_active(&self, id: TemplateId, active: bool) -> Result<FormTemplate> {
        self.mutate(id, |template| {
            if active {
                ensure_usable(template)?;
            }
            template.active = active;
            Ok(template.clone())
        })
    }

    /// Remove a template. Its submissions are left in place.
    pub fn delete(&self, id: TemplateId) -> bool {
        let removed = self.state.write().templates.remove(&id).is_some();
        if removed {
            tracing::info!(template_id = id, "form template deleted");
        }
        removed
    }

    // =========================================================================
    // Field CRUD
    // =========================================================================

    pub fn add_field(&self, id: TemplateId, page: Option<PageId>, draft: FieldDraft) -> Result<Field> {
        let mut state = self.state.write();
        let field_id = state.next_field_id;
        let template = state
            .templates
            .get_mut(&id)
            .ok_or(FormsError::TemplateNotFound(id))?;

        let index = page_index(template, page)?;
        let target = &mut template.pages_mut()[index];
        let field = Field::from_draft(field_id, target.fields.len() as u32 + 1, draft);
        target.fields.push(field.clone());
        template.touch();
        state.next_field_id += 1;

        tracing::debug!(template_id = id, field_id, "field added");
        Ok(field)
    }

    /// Patch a field in place.
    ///
    /// Pointing a submission dropdown at a different source form clears the
    /// source field of every autofill link that reads through it.
    pub fn update_field(&self, id: TemplateId, field_id: FieldId, patch: FieldPatch) -> Result<Field> {
        self.mutate(id, |template| {
            let before = template
                .field(field_id)
                .map(|f| f.source_form_id)
                .ok_or(FormsError::FieldNotFound(field_id))?;

            let updated = template
                .apply_field_patch(field_id, patch)
                .ok_or(FormsError::FieldNotFound(field_id))?;

            if updated.field_type == FieldType::SubmissionDropdown && updated.source_form_id != before {
                invalidate_autofill_links(template, field_id);
            }
            Ok(updated)
        })
    }

    pub fn delete_field(&self, id: TemplateId, field_id: FieldId) -> Result<()> {
        self.mutate(id, |template| {
            let (pi, fi) = template
                .locate(field_id)
                .ok_or(FormsError::FieldNotFound(field_id))?;
            let page = &mut template.pages_mut()[pi];
            page.fields.remove(fi);
            page.renumber();
            Ok(())
        })
    }

    /// Swap a field with its neighbor on the same page. `false` at the edge.
    pub fn move_field(&self, id: TemplateId, field_id: FieldId, direction: MoveDirection) -> Result<bool> {
        self.mutate(id, |template| {
            let (pi, fi) = template
                .locate(field_id)
                .ok_or(FormsError::FieldNotFound(field_id))?;
            let page = &mut template.pages_mut()[pi];
            let target = match direction {
                MoveDirection::Up if fi > 0 => fi - 1,
                MoveDirection::Down if fi + 1 < page.fields.len() => fi + 1,
                _ => return Ok(false),
            };
            page.fields.swap(fi, target);
            page.renumber();
            Ok(true)
        })
    }

    /// Rewrite the order of one page. `field_ids` must list every field on it.
    pub fn reorder_fields(&self, id: TemplateId, page: Option<PageId>, field_ids: &[FieldId]) -> Result<()> {
        self.mutate(id, |template| {
            let index = page_index(template, page)?;
            let target = &mut template.pages_mut()[index];

            let mut current: Vec<FieldId> = target.fields.iter().map(|f| f.id).collect();
            let mut requested = field_ids.to_vec();
            current.sort_unstable();
            requested.sort_unstable();
            if current != requested {
                return Err(FormsError::Validation(
                    "reorder must list every field on the page exactly once".into(),
                ));
            }

            let mut fields = std::mem::take(&mut target.fields);
            for field_id in field_ids {
                if let Some(pos) = fields.iter().position(|f| f.id == *field_id) {
                    target.fields.push(fields.swap_remove(pos));
                }
            }
            target.renumber();
            Ok(())
        })
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Wrap the current field list as page 1
    pub fn convert_to_multi_page(&self, id: TemplateId) -> Result<FormTemplate> {
        self.mutate(id, |template| {
            if template.is_multi_page() {
                return Err(FormsError::Validation("template is already multi-page".into()));
            }
            let mut page = Page::new(1, "Page 1", "");
            page.fields = template.fields().cloned().collect();
            page.renumber();
            template.set_layout(true, vec![page]);
            tracing::info!(template_id = id, "template converted to multi-page");
            Ok(template.clone())
        })
    }

    /// Concatenate every page's fields in page order. Page boundaries are lost,
    /// so the caller must confirm.
    pub fn convert_to_single_page(&self, id: TemplateId, confirm: bool) -> Result<FormTemplate> {
        self.mutate(id, |template| {
            if !template.is_multi_page() {
                return Err(FormsError::Validation("template is already single-page".into()));
            }
            if template.pages().len() > 1 && !confirm {
                return Err(FormsError::Validation(
                    "merging pages discards page boundaries; confirmation required".into(),
                ));
            }
            let mut page = Page::new(1, "", "");
            page.fields = template.fields().cloned().collect();
            page.renumber();
            template.set_layout(false, vec![page]);
            tracing::info!(template_id = id, "template converted to single-page");
            Ok(template.clone())
        })
    }

    pub fn add_page(&self, id: TemplateId, draft: PageDraft) -> Result<Page> {
        self.mutate(id, |template| {
            require_multi_page(template)?;
            let page_id = template.pages().iter().map(|p| p.page_id).max().unwrap_or(0) + 1;
            let page = Page::new(page_id, draft.title, draft.description);
            template.pages_mut().push(page.clone());
            Ok(page)
        })
    }

    pub fn update_page(&self, id: TemplateId, page_id: PageId, patch: PagePatch) -> Result<Page> {
        self.mutate(id, |template| {
            require_multi_page(template)?;
            let page = template
                .pages_mut()
                .iter_mut()
                .find(|p| p.page_id == page_id)
                .ok_or(FormsError::PageNotFound(page_id))?;
            if let Some(title) = patch.title {
                page.title = title;
            }
            if let Some(description) = patch.description {
                page.description = description;
            }
            Ok(page.clone())
        })
    }

    /// Remove a page and its fields. The last page cannot be removed.
    pub fn delete_page(&self, id: TemplateId, page_id: PageId) -> Result<()> {
        self.mutate(id, |template| {
            require_multi_page(template)?;
            let index = template
                .pages()
                .iter()
                .position(|p| p.page_id == page_id)
                .ok_or(FormsError::PageNotFound(page_id))?;
            if template.pages().len() == 1 {
                return Err(FormsError::Validation("a template needs at least one page".into()));
            }
            template.pages_mut().remove(index);
            Ok(())
        })
    }

    /// Run `f` against one template under the write lock; stamps `updated_at` on success
    fn mutate<T>(&self, id: TemplateId, f: impl FnOnce(&mut FormTemplate) -> Result<T>) -> Result<T> {
        let mut state = self.state.write();
        let template = state
            .templates
            .get_mut(&id)
            .ok_or(FormsError::TemplateNotFound(id))?;
        let out = f(template)?;
        template.touch();
        Ok(out)
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn page_index(template: &FormTemplate, page: Option<PageId>) -> Result<usize> {
    match page {
        None if template.is_multi_page() => Err(FormsError::Validation(
            "multi-page templates need an explicit page id".into(),
        )),
        None => Ok(0),
        Some(page_id) => template
            .pages()
            .iter()
            .position(|p| p.page_id == page_id)
            .ok_or(FormsError::PageNotFound(page_id)),
    }
}

fn require_multi_page(template: &FormTemplate) -> Result<()> {
    if template.is_multi_page() {
        Ok(())
    } else {
        Err(FormsError::Validation("template is single-page; convert it first".into()))
    }
}

fn ensure_usable(template: &FormTemplate) -> Result<()> {
    let issues = template.issues();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(FormsError::NotUsable(issues))
    }
}

fn invalidate_autofill_links(template: &mut FormTemplate, dropdown_id: FieldId) {
    for page in template.pages_mut() {
        for field in page.fields.iter_mut() {
            if let Some(link) = field.autofill.as_mut() {
                if link.linked_dropdown_field_id == dropdown_id && link.source_field_id.take().is_some() {
                    tracing::debug!(field_id = field.id, dropdown_id, "autofill source field cleared");
                }
            }
        }
    }
}
