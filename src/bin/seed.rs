use rust_decimal::Decimal;
use salon_storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
};
use sqlx::PgPool;
use uuid::Uuid;

// Fixed ids keep re-runs idempotent.
const HAIR_CARE: Uuid = Uuid::from_u128(0x5a10_0000_0000_0000_0000_0000_0000_0001);
const SKIN_CARE: Uuid = Uuid::from_u128(0x5a10_0000_0000_0000_0000_0000_0000_0002);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(config.require_database_url()?).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;
    let pool = orm.get_postgres_connection_pool();

    seed_categories(pool).await?;
    seed_products(pool).await?;
    seed_services(pool).await?;

    let admin_id = std::env::var("SEED_ADMIN_ID").unwrap_or_else(|_| "admin".to_string());
    ensure_admin_profile(pool, &admin_id, "admin@example.com").await?;

    println!("Seed completed. Admin profile: {admin_id}");
    Ok(())
}

async fn seed_categories(pool: &PgPool) -> anyhow::Result<()> {
    for (id, name) in [(HAIR_CARE, "Hair care"), (SKIN_CARE, "Skin care")] {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &PgPool) -> anyhow::Result<()> {
    let products = vec![
        ("Argan Repair Shampoo", "Maison Lune", "HC-001", HAIR_CARE, 2400, 0, 40, true),
        ("Silk Protein Mask", "Maison Lune", "HC-002", HAIR_CARE, 3150, 10, 25, false),
        ("Rosewater Toner", "Atelier Rose", "SC-001", SKIN_CARE, 1890, 0, 60, true),
        ("Night Recovery Cream", "Atelier Rose", "SC-002", SKIN_CARE, 4500, 20, 15, false),
    ];

    for (title, brand, sku, category, cents, discount, stock, featured) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, title, brand, sku, price, discount, stock, category_id, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (sku) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(brand)
        .bind(sku)
        .bind(Decimal::new(cents, 2))
        .bind(discount)
        .bind(stock)
        .bind(category)
        .bind(featured)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_services(pool: &PgPool) -> anyhow::Result<()> {
    let services = [
        (0x5e01_u128, "Haircut & styling", "Wash, cut and blow-dry", 60, 4500),
        (0x5e02_u128, "Manicure", "Classic manicure with polish", 45, 3000),
        (0x5e03_u128, "Facial", "Deep cleansing facial", 75, 6500),
    ];

    for (id, title, description, minutes, cents) in services {
        sqlx::query(
            r#"
            INSERT INTO services (id, title, description, duration_minutes, price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::from_u128(id))
        .bind(title)
        .bind(description)
        .bind(minutes)
        .bind(Decimal::new(cents, 2))
        .execute(pool)
        .await?;
    }

    println!("Seeded services");
    Ok(())
}

async fn ensure_admin_profile(pool: &PgPool, user_id: &str, email: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, surname, phone, email, is_admin)
        VALUES ($1, 'Salon', 'Admin', '0000000000', $2, TRUE)
        ON CONFLICT (id) DO UPDATE SET is_admin = TRUE
        "#,
    )
    .bind(user_id)
    .bind(email)
    .execute(pool)
    .await?;

    Ok(())
}
