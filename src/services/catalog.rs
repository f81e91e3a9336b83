use crate::{
    entities::{
        brand, category, product, product_image, Brand, BrandModel, Category, CategoryModel,
        Product, ProductImage, ProductImageModel, ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    slug::slugify,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// Catalog service for categories, brands, products, and product images.
///
/// Slugs default to a slugified name when absent (§ slug rules live in
/// [`crate::slug`]); the unique indexes reject colliding writes. Image
/// writes maintain the single-main-image invariant per product inside a
/// transaction.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    // ---- Categories ----

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let slug = derive_slug(input.slug.as_deref(), &input.name)?;
        self.ensure_unique_category(&input.name, &slug).await?;

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
        };

        let category = category.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category.id))
            .await;

        info!("Created category: {}", category.id);
        Ok(category)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        let category = Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        let mut active: category::ActiveModel = category.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let category = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;

        Ok(category)
    }

    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let category = Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;

        category.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!("Deleted category: {}", category_id);
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<CategoryModel, ServiceError> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", slug)))
    }

    // ---- Brands ----

    #[instrument(skip(self, input))]
    pub async fn create_brand(&self, input: CreateBrandInput) -> Result<BrandModel, ServiceError> {
        let slug = derive_slug(input.slug.as_deref(), &input.name)?;
        self.ensure_unique_brand(&input.name, &slug).await?;

        let brand = brand::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
        };

        let brand = brand.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BrandCreated(brand.id))
            .await;

        info!("Created brand: {}", brand.id);
        Ok(brand)
    }

    #[instrument(skip(self, input))]
    pub async fn update_brand(
        &self,
        brand_id: Uuid,
        input: UpdateBrandInput,
    ) -> Result<BrandModel, ServiceError> {
        let brand = Brand::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", brand_id)))?;

        let mut active: brand::ActiveModel = brand.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let brand = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BrandUpdated(brand_id))
            .await;

        Ok(brand)
    }

    pub async fn delete_brand(&self, brand_id: Uuid) -> Result<(), ServiceError> {
        let brand = Brand::find_by_id(brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", brand_id)))?;

        brand.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::BrandDeleted(brand_id))
            .await;

        info!("Deleted brand: {}", brand_id);
        Ok(())
    }

    pub async fn list_brands(&self) -> Result<Vec<BrandModel>, ServiceError> {
        Brand::find()
            .order_by_asc(brand::Column::Name)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn get_brand_by_slug(&self, slug: &str) -> Result<BrandModel, ServiceError> {
        Brand::find()
            .filter(brand::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", slug)))
    }

    // ---- Products ----

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        // FK targets must exist before the insert so the caller gets a clear
        // not-found instead of a referential-integrity failure.
        Category::find_by_id(input.category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Category {} not found", input.category_id))
            })?;
        Brand::find_by_id(input.brand_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Brand {} not found", input.brand_id)))?;

        let slug = derive_slug(input.slug.as_deref(), &input.name)?;
        self.ensure_unique_sku(&input.sku).await?;

        let product_id = Uuid::new_v4();
        let now = Utc::now();

        let product = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name),
            slug: Set(slug),
            sku: Set(input.sku),
            description: Set(input.description),
            category_id: Set(input.category_id),
            brand_id: Set(input.brand_id),
            price: Set(input.price),
            sale_price: Set(input.sale_price),
            stock_quantity: Set(input.stock_quantity.unwrap_or(0)),
            weight_kg: Set(input.weight_kg),
            is_active: Set(input.is_active.unwrap_or(true)),
            is_featured: Set(input.is_featured.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(product)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let product = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = product.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(slug) = input.slug {
            active.slug = Set(slug);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(brand_id) = input.brand_id {
            active.brand_id = Set(brand_id);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if input.sale_price.is_some() {
            active.sale_price = Set(input.sale_price);
        }
        if let Some(stock_quantity) = input.stock_quantity {
            active.stock_quantity = Set(stock_quantity);
        }
        if input.weight_kg.is_some() {
            active.weight_kg = Set(input.weight_kg);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_featured) = input.is_featured {
            active.is_featured = Set(is_featured);
        }
        active.updated_at = Set(Utc::now());

        let product = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!("Updated product: {}", product_id);
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = self.get_product(product_id).await?;
        product.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Deleted product: {}", product_id);
        Ok(())
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// Product detail addressed by id: the product plus its gallery.
    pub async fn get_product_detail(&self, product_id: Uuid) -> Result<ProductDetail, ServiceError> {
        let product = self.get_product(product_id).await?;
        let images = self.list_images(product.id).await?;

        Ok(ProductDetail { product, images })
    }

    /// Product detail for storefront pages: the product plus its gallery.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, ServiceError> {
        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", slug)))?;

        let images = self.list_images(product.id).await?;

        Ok(ProductDetail { product, images })
    }

    /// Lists products with optional filters, newest first.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<ProductPage, ServiceError> {
        let mut db_query = Product::find();

        if let Some(slug) = &query.category_slug {
            let category = self.get_category_by_slug(slug).await?;
            db_query = db_query.filter(product::Column::CategoryId.eq(category.id));
        }

        if let Some(slug) = &query.brand_slug {
            let brand = self.get_brand_by_slug(slug).await?;
            db_query = db_query.filter(product::Column::BrandId.eq(brand.id));
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let term = search.trim();
            db_query = db_query.filter(
                product::Column::Name
                    .contains(term)
                    .or(product::Column::Description.contains(term))
                    .or(product::Column::Sku.contains(term)),
            );
        }

        if let Some(is_featured) = query.featured {
            db_query = db_query.filter(product::Column::IsFeatured.eq(is_featured));
        }

        if let Some(is_active) = query.active {
            db_query = db_query.filter(product::Column::IsActive.eq(is_active));
        }

        let per_page = query
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = query.page.unwrap_or(1).max(1);

        let paginator = db_query
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            products,
            total,
            page,
            per_page,
        })
    }

    // ---- Product images ----

    /// Adds a gallery image. When flagged as main, the product's previous
    /// main image is cleared in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn add_image(
        &self,
        product_id: Uuid,
        input: AddImageInput,
    ) -> Result<ProductImageModel, ServiceError> {
        self.get_product(product_id).await?;

        let txn = self.db.begin().await?;

        if input.is_main {
            clear_main_image(&txn, product_id).await?;
        }

        let image_id = Uuid::new_v4();
        let image = product_image::ActiveModel {
            id: Set(image_id),
            product_id: Set(product_id),
            url: Set(input.url),
            alt_text: Set(input.alt_text),
            is_main: Set(input.is_main),
            sort_order: Set(input.sort_order.unwrap_or(0)),
            created_at: Set(Utc::now()),
        };

        let image = image.insert(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductImageAdded {
                product_id,
                image_id,
            })
            .await;

        info!("Added image {} to product {}", image_id, product_id);
        Ok(image)
    }

    /// Promotes an existing image to be the product's main image.
    #[instrument(skip(self))]
    pub async fn set_main_image(
        &self,
        product_id: Uuid,
        image_id: Uuid,
    ) -> Result<ProductImageModel, ServiceError> {
        let txn = self.db.begin().await?;

        let image = ProductImage::find_by_id(image_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;

        if image.product_id != product_id {
            return Err(ServiceError::InvalidOperation(
                "Image does not belong to this product".to_string(),
            ));
        }

        clear_main_image(&txn, product_id).await?;

        let mut active: product_image::ActiveModel = image.into();
        active.is_main = Set(true);
        let image = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::MainImageChanged {
                product_id,
                image_id,
            })
            .await;

        Ok(image)
    }

    /// Lists a product's gallery, main image first.
    pub async fn list_images(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductImageModel>, ServiceError> {
        ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_desc(product_image::Column::IsMain)
            .order_by_asc(product_image::Column::SortOrder)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    pub async fn delete_image(&self, product_id: Uuid, image_id: Uuid) -> Result<(), ServiceError> {
        let image = ProductImage::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;

        if image.product_id != product_id {
            return Err(ServiceError::InvalidOperation(
                "Image does not belong to this product".to_string(),
            ));
        }

        image.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductImageRemoved {
                product_id,
                image_id,
            })
            .await;

        Ok(())
    }

    // ---- uniqueness pre-checks ----

    async fn ensure_unique_category(&self, name: &str, slug: &str) -> Result<(), ServiceError> {
        let existing = Category::find()
            .filter(
                category::Column::Name
                    .eq(name)
                    .or(category::Column::Slug.eq(slug)),
            )
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category with name '{}' or slug '{}' already exists",
                name, slug
            )));
        }
        Ok(())
    }

    async fn ensure_unique_brand(&self, name: &str, slug: &str) -> Result<(), ServiceError> {
        let existing = Brand::find()
            .filter(
                brand::Column::Name
                    .eq(name)
                    .or(brand::Column::Slug.eq(slug)),
            )
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Brand with name '{}' or slug '{}' already exists",
                name, slug
            )));
        }
        Ok(())
    }

    async fn ensure_unique_sku(&self, sku: &str) -> Result<(), ServiceError> {
        let existing = Product::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU '{}' already exists",
                sku
            )));
        }
        Ok(())
    }
}

/// Clears the main flag on every image of `product_id` as a single
/// statement, so the set that follows leaves exactly one main row.
async fn clear_main_image(
    conn: &impl sea_orm::ConnectionTrait,
    product_id: Uuid,
) -> Result<(), ServiceError> {
    ProductImage::update_many()
        .col_expr(product_image::Column::IsMain, Expr::value(false))
        .filter(product_image::Column::ProductId.eq(product_id))
        .filter(product_image::Column::IsMain.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

/// Uses the provided slug when present, otherwise derives one from the name.
fn derive_slug(slug: Option<&str>, name: &str) -> Result<String, ServiceError> {
    let slug = match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => explicit.to_string(),
        None => slugify(name),
    };

    if slug.is_empty() {
        return Err(ServiceError::InvalidInput(format!(
            "Cannot derive a slug from name '{}'",
            name
        )));
    }

    Ok(slug)
}

/// Input for adding a product image
#[derive(Debug, Deserialize)]
pub struct AddImageInput {
    pub url: String,
    pub alt_text: Option<String>,
    pub is_main: bool,
    pub sort_order: Option<i32>,
}

/// Input for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for creating a brand
#[derive(Debug, Deserialize)]
pub struct CreateBrandInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for updating a brand
#[derive(Debug, Deserialize)]
pub struct UpdateBrandInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub slug: Option<String>,
    pub sku: String,
    pub description: String,
    pub category_id: Uuid,
    pub brand_id: Uuid,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub weight_kg: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub weight_kg: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// Filters for listing products
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category_slug: Option<String>,
    pub brand_slug: Option<String>,
    pub featured: Option<bool>,
    pub active: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// One page of products
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<ProductModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Product with its image gallery
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub images: Vec<ProductImageModel>,
}
