use crate::{
    entities::{
        category::{self, Entity as CategoryEntity},
        product,
    },
    errors::ServiceError,
    services::common::{resolve_slug, AssetPolicy},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update. `parent_id: null` moves the category to the root;
/// omitting it keeps the current parent.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Distinguishes an explicit `null` from an absent field.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Storefront category tree node
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i32,
    #[schema(no_recursion)]
    pub children: Vec<CategoryNode>,
}

/// Builds the tree of active categories, sorted by `sort_order` then name.
///
/// A node is only reachable through active ancestors, so children of
/// inactive parents are dropped along with them.
pub fn build_tree(categories: Vec<category::Model>) -> Vec<CategoryNode> {
    let active: Vec<category::Model> = categories.into_iter().filter(|c| c.is_active).collect();
    let ids: HashSet<Uuid> = active.iter().map(|c| c.id).collect();

    let mut by_parent: HashMap<Option<Uuid>, Vec<category::Model>> = HashMap::new();
    let mut roots = Vec::new();
    for cat in active {
        match cat.parent_id {
            None => roots.push(cat),
            Some(parent) if ids.contains(&parent) => {
                by_parent.entry(Some(parent)).or_default().push(cat)
            }
            // Parent is inactive or missing
            Some(_) => {}
        }
    }

    fn sort(list: &mut [category::Model]) {
        list.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
    }

    fn attach(
        mut nodes: Vec<category::Model>,
        by_parent: &mut HashMap<Option<Uuid>, Vec<category::Model>>,
    ) -> Vec<CategoryNode> {
        sort(&mut nodes);
        nodes
            .into_iter()
            .map(|c| {
                let kids = by_parent.remove(&Some(c.id)).unwrap_or_default();
                CategoryNode {
                    id: c.id,
                    name: c.name,
                    slug: c.slug,
                    description: c.description,
                    image_url: c.image_url,
                    sort_order: c.sort_order,
                    children: attach(kids, by_parent),
                }
            })
            .collect()
    }

    attach(roots, &mut by_parent)
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    assets: AssetPolicy,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, assets: AssetPolicy) -> Self {
        Self { db, assets }
    }

    async fn ensure_unique_slug(
        &self,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = CategoryEntity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' is already taken",
                slug
            )));
        }
        Ok(())
    }

    /// The parent must exist and must not be `id` or one of its descendants.
    async fn check_parent(&self, id: Option<Uuid>, parent_id: Uuid) -> Result<(), ServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(parent_id);

        while let Some(current) = cursor {
            if Some(current) == id {
                return Err(ServiceError::InvalidOperation(
                    "A category cannot be nested under itself or one of its descendants"
                        .to_string(),
                ));
            }
            if !visited.insert(current) {
                break;
            }
            let node = CategoryEntity::find_by_id(current)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Parent category", current))?;
            cursor = node.parent_id;
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        self.assets
            .check_opt("image_url", request.image_url.as_deref())?;
        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_unique_slug(&slug, None).await?;
        if let Some(parent_id) = request.parent_id {
            self.check_parent(None, parent_id).await?;
        }

        let now = Utc::now();
        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            slug: Set(slug),
            description: Set(request.description),
            image_url: Set(request.image_url),
            parent_id: Set(request.parent_id),
            sort_order: Set(request.sort_order),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = %created.id, "Category created");
        Ok(created)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(CategoryEntity::find()
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        let existing = self.get_category(id).await?;
        self.assets
            .check_opt("image_url", request.image_url.as_deref())?;

        let name = request.name.clone().unwrap_or_else(|| existing.name.clone());
        let slug = match request.slug.as_deref() {
            Some(given) => {
                let slug = resolve_slug(Some(given), &name)?;
                self.ensure_unique_slug(&slug, Some(id)).await?;
                Some(slug)
            }
            None => None,
        };
        if let Some(Some(parent_id)) = request.parent_id {
            self.check_parent(Some(id), parent_id).await?;
        }

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(slug) = slug {
            active.slug = Set(slug);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(image_url) = request.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(parent_id) = request.parent_id {
            active.parent_id = Set(parent_id);
        }
        if let Some(sort_order) = request.sort_order {
            active.sort_order = Set(sort_order);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db).await?)
    }

    /// Refused while child categories or products still reference it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_category(id).await?;

        let children = CategoryEntity::find()
            .filter(category::Column::ParentId.eq(id))
            .count(&*self.db)
            .await?;
        if children > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category has {} child categories",
                children
            )));
        }

        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&*self.db)
            .await?;
        if products > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category is used by {} products",
                products
            )));
        }

        existing.delete(&*self.db).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    pub async fn category_tree(&self) -> Result<Vec<CategoryNode>, ServiceError> {
        let all = CategoryEntity::find()
            .filter(category::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;
        Ok(build_tree(all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(name: &str, parent: Option<Uuid>, sort_order: i32, is_active: bool) -> category::Model {
        let now = Utc::now();
        category::Model {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: name.to_lowercase(),
            description: None,
            image_url: None,
            parent_id: parent,
            sort_order,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn tree_orders_by_sort_order_then_name() {
        let home = cat("Home", None, 1, true);
        let apparel = cat("Apparel", None, 0, true);
        let beds = cat("Beds", Some(home.id), 0, true);
        let arm = cat("Armchairs", Some(home.id), 0, true);

        let tree = build_tree(vec![home.clone(), apparel, beds, arm]);
        assert_eq!(tree[0].name, "Apparel");
        assert_eq!(tree[1].name, "Home");
        let kids: Vec<_> = tree[1].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(kids, vec!["Armchairs", "Beds"]);
    }

    #[test]
    fn children_of_inactive_parents_are_hidden() {
        let hidden = cat("Hidden", None, 0, false);
        let child = cat("Child", Some(hidden.id), 0, true);
        let grandchild = cat("Grandchild", Some(child.id), 0, true);

        let tree = build_tree(vec![hidden, child, grandchild]);
        assert!(tree.is_empty());
    }
}
